use super::TypeCheckError;
use crate::value::Value;
use log::debug;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Integer,
    Decimal,
    String,
    Boolean,
    Null,
}

impl PrimitiveType {
    /// Parses a declared type name, case-insensitively, aliases included.
    pub fn parse(name: &str) -> Option<Self> {
        let ty = match name.to_ascii_lowercase().as_str() {
            "entier" | "int" | "integer" => PrimitiveType::Integer,
            "decimal" | "double" | "float" | "reel" => PrimitiveType::Decimal,
            "chaine" | "string" | "str" => PrimitiveType::String,
            "booleen" | "boolean" | "bool" => PrimitiveType::Boolean,
            "nul" | "null" => PrimitiveType::Null,
            _ => return None,
        };

        Some(ty)
    }

    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => PrimitiveType::Null,
            Value::Boolean(_) => PrimitiveType::Boolean,
            Value::Integer(_) => PrimitiveType::Integer,
            Value::Decimal(_) => PrimitiveType::Decimal,
            Value::String(_) => PrimitiveType::String,
        }
    }

    /// Canonical name, as reported in errors.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Integer => "Entier",
            PrimitiveType::Decimal => "Decimal",
            PrimitiveType::String => "Chaine",
            PrimitiveType::Boolean => "Booleen",
            PrimitiveType::Null => "Nul",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone)]
struct VariableType {
    ty: String,
    views: BTreeSet<String>,
}

/// Answers "is this variable evaluable as that type?".
///
/// A variable of type `T` is evaluable as `V` iff `V == T` or `V` is one of
/// the views registered with the variable. There is no subtyping.
#[derive(Debug, Default)]
pub struct TypeChecker {
    variables: HashMap<String, VariableType>,
    view_types: HashSet<String>,
    // type name -> views declared over values of that type
    associations: HashMap<String, BTreeSet<String>>,
    errors: Vec<TypeCheckError>,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable<S, I>(&mut self, name: S, ty: S, views: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = String>,
    {
        self.variables.insert(
            name.into(),
            VariableType {
                ty: ty.into(),
                views: views.into_iter().collect(),
            },
        );
    }

    pub fn add_view_type<S: Into<String>>(&mut self, view: S) {
        self.view_types.insert(view.into());
    }

    pub fn is_view_type(&self, name: &str) -> bool {
        self.view_types.contains(name)
    }

    /// Declares `view` as a view of values of type `ty`.
    pub fn associate_view<S: Into<String>>(&mut self, ty: S, view: S) {
        let view = view.into();

        self.add_view_type(view.clone());
        self.associations.entry(ty.into()).or_default().insert(view);
    }

    pub fn views_of(&self, ty: &str) -> BTreeSet<String> {
        self.associations.get(ty).cloned().unwrap_or_default()
    }

    pub fn is_evaluable(&mut self, name: &str, expected: &str) -> bool {
        let variable = match self.variables.get(name) {
            Some(variable) => variable,
            None => {
                self.errors
                    .push(TypeCheckError::UnknownVariable(name.to_string()));
                return false;
            }
        };

        if variable.ty == expected || variable.views.contains(expected) {
            return true;
        }

        debug!(
            "`{}`: `{}` is not evaluable as `{}` (views: {:?})",
            name, variable.ty, expected, variable.views
        );
        let err = TypeCheckError::NotEvaluable {
            name: name.to_string(),
            expected: expected.to_string(),
            actual: variable.ty.clone(),
        };
        self.errors.push(err);

        false
    }

    pub fn errors(&self) -> &[TypeCheckError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn primitive_aliases() {
        assert_eq!(PrimitiveType::parse("Entier"), Some(PrimitiveType::Integer));
        assert_eq!(PrimitiveType::parse("INT"), Some(PrimitiveType::Integer));
        assert_eq!(PrimitiveType::parse("reel"), Some(PrimitiveType::Decimal));
        assert_eq!(PrimitiveType::parse("String"), Some(PrimitiveType::String));
        assert_eq!(PrimitiveType::parse("Booleen"), Some(PrimitiveType::Boolean));
        assert_eq!(PrimitiveType::parse("nul"), Some(PrimitiveType::Null));
        assert_eq!(PrimitiveType::parse("Montant"), None);
    }

    #[test]
    fn type_of_value() {
        assert_eq!(PrimitiveType::of(&Value::Integer(1)).name(), "Entier");
        assert_eq!(PrimitiveType::of(&Value::Decimal(1.5)).name(), "Decimal");
        assert_eq!(PrimitiveType::of(&Value::from("a")).name(), "Chaine");
        assert_eq!(PrimitiveType::of(&Value::Null).to_string(), "Nul");
    }

    #[test]
    fn evaluable_as_declared_type() {
        let mut checker = TypeChecker::new();
        checker.add_variable("x", "Entier", vec![]);

        assert!(checker.is_evaluable("x", "Entier"));
        assert!(!checker.has_errors());
    }

    #[test]
    fn evaluable_as_view() {
        let mut checker = TypeChecker::new();
        checker.add_view_type("Montant");
        checker.add_variable("x", "Entier", vec!["Montant".to_string()]);

        assert!(checker.is_view_type("Montant"));
        assert!(checker.is_evaluable("x", "Montant"));
        assert!(!checker.is_evaluable("x", "Chaine"));

        assert_eq!(checker.errors().len(), 1);
        assert_matches!(&checker.errors()[0], TypeCheckError::NotEvaluable { name, expected, actual } => {
            assert_eq!(name, "x");
            assert_eq!(expected, "Chaine");
            assert_eq!(actual, "Entier");
        });
    }

    #[test]
    fn unknown_variable_is_an_error() {
        let mut checker = TypeChecker::new();

        assert!(!checker.is_evaluable("missing", "Entier"));
        assert_eq!(
            checker.errors(),
            &[TypeCheckError::UnknownVariable("missing".to_string())]
        );
    }

    #[test]
    fn views_are_declared_per_type() {
        let mut checker = TypeChecker::new();
        checker.associate_view("Entier", "Montant");

        assert!(checker.is_view_type("Montant"));
        assert_eq!(
            checker.views_of("Entier").into_iter().collect::<Vec<_>>(),
            vec!["Montant".to_string()]
        );
        assert!(checker.views_of("Chaine").is_empty());
    }
}
