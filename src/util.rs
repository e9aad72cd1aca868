use std::cell::RefCell;
use std::rc::Rc;

pub fn wrap<T>(value: T) -> Rc<RefCell<T>> {
    Rc::new(RefCell::new(value))
}
