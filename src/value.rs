use crate::semantic::PrimitiveType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A runtime value produced by evaluating Jnane code.
///
/// The untagged representation lets named arguments come straight from a
/// JSON object (`{"first": 3, "second": 5}`).
#[derive(Debug, PartialEq, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
}

impl Value {
    /// A value is truthy iff it is non-null and either not a boolean or `true`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The name of this value's runtime type, as written in `@field` declarations.
    pub fn type_name(&self) -> &'static str {
        PrimitiveType::of(self).name()
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Decimal(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(true) => write!(f, "Vrai"),
            Value::Boolean(false) => write!(f, "Faux"),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Decimal(n) => write!(f, "{:?}", n),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(Value::Boolean(true).is_truthy());
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::from("").is_truthy());
    }

    #[test]
    fn display() {
        assert_eq!(Value::Integer(8).to_string(), "8");
        assert_eq!(Value::Decimal(8.0).to_string(), "8.0");
        assert_eq!(Value::Boolean(true).to_string(), "Vrai");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from("abc").to_string(), "abc");
    }

    #[test]
    fn from_json() {
        let value: Value = serde_json::from_str("3").unwrap();
        assert_matches!(value, Value::Integer(3));

        let value: Value = serde_json::from_str("2.5").unwrap();
        assert_matches!(value, Value::Decimal(n) => assert_eq!(n, 2.5));

        let value: Value = serde_json::from_str("null").unwrap();
        assert_matches!(value, Value::Null);

        let value: Value = serde_json::from_str("\"x\"").unwrap();
        assert_matches!(value, Value::String(s) => assert_eq!(s, "x"));
    }
}
