use crate::semantic::ValidationError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("`{function}` has no parameter named `{name}`")]
    Unknown { function: String, name: String },

    #[error("`{function}` requires the argument `{name}`")]
    Missing { function: String, name: String },

    #[error("positional argument in a call to `{function}`, arguments must be named")]
    Positional { function: String },

    #[error("argument `{name}` is passed twice to `{function}`")]
    Duplicate { function: String, name: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoercionError {
    #[error("`{text}` is not a valid {kind} literal")]
    InvalidLiteral { kind: &'static str, text: String },

    #[error("unsupported operands for `{operator}`: `{lhs}` and `{rhs}`")]
    UnsupportedOperands {
        operator: String,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("unsupported operand for `{operator}`: `{operand}`")]
    UnsupportedOperand {
        operator: String,
        operand: &'static str,
    },

    #[error("integer overflow in `{operator}`")]
    Overflow { operator: String },

    #[error("division by zero")]
    DivisionByZero,
}

/// Failure of one root invocation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("call cycle: `{name}` is already running ({})", .stack.join(" -> "))]
    CallCycle { name: String, stack: Vec<String> },

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("`{0}` produced no result")]
    NoResult(String),

    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Coercion(#[from] CoercionError),
}
