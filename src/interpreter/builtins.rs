use super::{CoercionError, NamedArgs, RuntimeError};
use crate::annotation::ParameterSet;
use crate::value::Value;

/// Functions resolved by name when no loaded unit matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `math:add(first, second)`
    Add,
    /// `print(message)`
    Print,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "math:add" => Some(Builtin::Add),
            "print" => Some(Builtin::Print),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Add => "math:add",
            Builtin::Print => "print",
        }
    }

    pub fn parameters(&self) -> ParameterSet {
        let mut parameters = ParameterSet::new();

        match self {
            Builtin::Add => {
                parameters.insert("first", Some("Entier".to_string()), false);
                parameters.insert("second", Some("Entier".to_string()), false);
            }
            Builtin::Print => {
                parameters.insert("message", None, false);
            }
        }

        parameters
    }

    /// Arguments must already be checked against `parameters()`.
    pub fn call(&self, mut args: NamedArgs) -> Result<Value, RuntimeError> {
        match self {
            Builtin::Add => {
                let first = args.remove("first").unwrap_or(Value::Null);
                let second = args.remove("second").unwrap_or(Value::Null);

                match (&first, &second) {
                    (Value::Integer(a), Value::Integer(b)) => a
                        .checked_add(*b)
                        .map(Value::Integer)
                        .ok_or_else(|| {
                            CoercionError::Overflow {
                                operator: self.name().to_string(),
                            }
                            .into()
                        }),
                    _ => Err(CoercionError::UnsupportedOperands {
                        operator: self.name().to_string(),
                        lhs: first.type_name(),
                        rhs: second.type_name(),
                    }
                    .into()),
                }
            }
            Builtin::Print => {
                let message = args.remove("message").unwrap_or(Value::Null);
                println!("{}", message);

                Ok(Value::Null)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn args(pairs: &[(&str, Value)]) -> NamedArgs {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn lookup() {
        assert_eq!(Builtin::lookup("math:add"), Some(Builtin::Add));
        assert_eq!(Builtin::lookup("print"), Some(Builtin::Print));
        assert_eq!(Builtin::lookup("math:sub"), None);
    }

    #[test]
    fn parameters() {
        let parameters = Builtin::Add.parameters();

        assert!(parameters.contains("first"));
        assert!(parameters.contains("second"));
        assert_eq!(parameters.required().count(), 2);
    }

    #[test]
    fn add() {
        let result = Builtin::Add.call(args(&[
            ("first", Value::Integer(3)),
            ("second", Value::Integer(5)),
        ]));

        assert_eq!(result, Ok(Value::Integer(8)));
    }

    #[test]
    fn add_rejects_strings() {
        let result = Builtin::Add.call(args(&[
            ("first", Value::Integer(3)),
            ("second", Value::from("5")),
        ]));

        assert_matches!(
            result,
            Err(RuntimeError::Coercion(CoercionError::UnsupportedOperands { rhs: "Chaine", .. }))
        );
    }

    #[test]
    fn add_overflow() {
        let result = Builtin::Add.call(args(&[
            ("first", Value::Integer(i64::MAX)),
            ("second", Value::Integer(1)),
        ]));

        assert_matches!(
            result,
            Err(RuntimeError::Coercion(CoercionError::Overflow { .. }))
        );
    }

    #[test]
    fn print_returns_null() {
        let result = Builtin::Print.call(args(&[("message", Value::from("hello"))]));
        assert_eq!(result, Ok(Value::Null));
    }
}
