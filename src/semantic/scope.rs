use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
enum ScopeKind {
    /// The outermost scope of one invocation, bound to the executing unit.
    Root { unit: String },
    Local {
        parent: Rc<RefCell<Scope>>,
        root: Rc<RefCell<Scope>>,
    },
}

/// Variable storage of a running unit.
///
/// Lookups delegate to the parent on miss. Bindings always land in the scope
/// they are made on, so a nested scope shadows its ancestors and never
/// mutates them.
#[derive(Debug)]
pub struct Scope {
    kind: ScopeKind,
    variables: HashMap<String, Value>,
}

impl Scope {
    pub fn root<S: Into<String>>(unit: S) -> Self {
        Self {
            kind: ScopeKind::Root { unit: unit.into() },
            variables: HashMap::new(),
        }
    }

    pub fn local(parent: &Rc<RefCell<Scope>>) -> Self {
        let root = match parent.borrow().kind {
            ScopeKind::Root { .. } => Rc::clone(parent),
            ScopeKind::Local { ref root, .. } => Rc::clone(root),
        };

        Self {
            kind: ScopeKind::Local {
                parent: Rc::clone(parent),
                root,
            },
            variables: HashMap::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, ScopeKind::Root { .. })
    }

    /// The root scope of the chain `this` belongs to.
    pub fn root_of(this: &Rc<RefCell<Scope>>) -> Rc<RefCell<Scope>> {
        match this.borrow().kind {
            ScopeKind::Root { .. } => Rc::clone(this),
            ScopeKind::Local { ref root, .. } => Rc::clone(root),
        }
    }

    /// Fully-qualified name of the unit executing in this chain.
    pub fn unit(&self) -> String {
        match self.kind {
            ScopeKind::Root { ref unit } => unit.clone(),
            ScopeKind::Local { ref root, .. } => root.borrow().unit(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        match self.variables.get(name) {
            Some(value) => Some(value.clone()),
            None => match self.kind {
                ScopeKind::Root { .. } => None,
                ScopeKind::Local { ref parent, .. } => parent.borrow().get(name),
            },
        }
    }

    pub fn has(&self, name: &str) -> bool {
        if self.variables.contains_key(name) {
            return true;
        }

        match self.kind {
            ScopeKind::Root { .. } => false,
            ScopeKind::Local { ref parent, .. } => parent.borrow().has(name),
        }
    }

    /// Binds `name` in this scope and returns the previous local value, if any.
    pub fn set<S: Into<String>>(&mut self, name: S, value: Value) -> Option<Value> {
        self.variables.insert(name.into(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::wrap;
    use assert_matches::assert_matches;

    #[test]
    fn root_scope() {
        let mut scope = Scope::root("test:add");

        assert!(scope.is_root());
        assert_eq!(scope.unit(), "test:add");
        assert_eq!(scope.get("x"), None);
        assert!(!scope.has("x"));

        assert_eq!(scope.set("x", Value::Integer(1)), None);
        assert_eq!(scope.set("x", Value::Integer(2)), Some(Value::Integer(1)));
        assert_eq!(scope.get("x"), Some(Value::Integer(2)));
    }

    #[test]
    fn local_sees_parent() {
        let root = wrap(Scope::root("test:f"));
        root.borrow_mut().set("x", Value::Integer(1));

        let local = Scope::local(&root);

        assert!(!local.is_root());
        assert!(local.has("x"));
        assert_eq!(local.get("x"), Some(Value::Integer(1)));
        assert_eq!(local.unit(), "test:f");
    }

    #[test]
    fn local_binding_is_invisible_to_parent() {
        let root = wrap(Scope::root("test:f"));
        let mut local = Scope::local(&root);

        local.set("y", Value::from("local"));

        assert!(local.has("y"));
        assert!(!root.borrow().has("y"));
        assert_eq!(root.borrow().get("y"), None);
    }

    #[test]
    fn shadowing_does_not_alter_ancestor() {
        let root = wrap(Scope::root("test:f"));
        root.borrow_mut().set("x", Value::Integer(1));

        let mut local = Scope::local(&root);
        assert_eq!(local.set("x", Value::Integer(2)), None);

        assert_eq!(local.get("x"), Some(Value::Integer(2)));
        assert_matches!(root.borrow().get("x"), Some(Value::Integer(1)));
    }

    #[test]
    fn root_identity_is_stable() {
        let root = wrap(Scope::root("ns.sub:g"));
        let middle = wrap(Scope::local(&root));
        let inner = wrap(Scope::local(&middle));

        assert!(Rc::ptr_eq(&Scope::root_of(&root), &root));
        assert!(Rc::ptr_eq(&Scope::root_of(&middle), &root));
        assert!(Rc::ptr_eq(&Scope::root_of(&inner), &Scope::root_of(&middle)));
        assert_eq!(inner.borrow().unit(), "ns.sub:g");
    }

    #[test]
    fn nested_lookup() {
        let root = wrap(Scope::root("test:f"));
        root.borrow_mut().set("a", Value::Integer(1));

        let middle = wrap(Scope::local(&root));
        middle.borrow_mut().set("b", Value::Integer(2));

        let inner = Scope::local(&middle);

        assert_eq!(inner.get("a"), Some(Value::Integer(1)));
        assert_eq!(inner.get("b"), Some(Value::Integer(2)));
        assert!(!root.borrow().has("b"));
    }
}
