use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeCheckError {
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("`{name}` has type `{actual}` and is not evaluable as `{expected}`")]
    NotEvaluable {
        name: String,
        expected: String,
        actual: String,
    },
}

/// A declared `@field` / `@view` obligation that does not hold after execution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("field `{field}` is declared as `{declared}` but was never set")]
    MissingField { field: String, declared: String },

    #[error("field `{field}` is declared as `{declared}`, found `{actual}`")]
    IncompatibleType {
        field: String,
        declared: String,
        actual: String,
    },
}
