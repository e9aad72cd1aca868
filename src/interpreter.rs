mod builtins;
mod engine;
mod errors;
mod evaluator;

pub use builtins::Builtin;
pub use engine::{check_arguments, Interpreter};
pub use errors::{ArgumentError, CoercionError, RuntimeError};
pub use evaluator::coerce_literal;

use crate::value::Value;
use std::collections::BTreeMap;

/// Arguments of a call, by parameter name.
pub type NamedArgs = BTreeMap<String, Value>;
