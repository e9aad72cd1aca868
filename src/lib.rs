#![deny(unused, nonstandard_style, rust_2018_idioms)]

pub mod annotation;
pub mod driver;
pub mod interpreter;
pub mod loader;
pub mod semantic;
pub mod syntax;
pub mod value;

mod util;

pub use interpreter::{Interpreter, NamedArgs, RuntimeError};
pub use loader::{Library, LoadError, Loader};
pub use value::Value;
