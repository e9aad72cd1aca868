mod errors;
mod scope;
mod types;

pub use errors::{TypeCheckError, ValidationError};
pub use scope::Scope;
pub use types::*;

use crate::annotation::FieldInfo;
use log::error;
use std::collections::BTreeMap;

/// Checks `@field` / `@view` obligations against the final scope of a unit.
///
/// Views are registered first: each `@view name: V` whose variable exists
/// makes `V` a view of that variable's runtime type. Every annotated
/// variable must then exist and be evaluable as its declared type.
pub fn validate(fields: &BTreeMap<String, FieldInfo>, scope: &Scope) -> Result<(), ValidationError> {
    let mut checker = TypeChecker::new();

    for (name, info) in fields.iter().filter(|(_, info)| info.is_view) {
        if let Some(value) = scope.get(name) {
            checker.associate_view(value.type_name(), info.ty.as_str());
        }
    }

    for (name, info) in fields {
        let value = match scope.get(name) {
            Some(value) => value,
            None => {
                error!("{}: missing field `{}`", scope.unit(), name);
                return Err(ValidationError::MissingField {
                    field: name.clone(),
                    declared: info.ty.clone(),
                });
            }
        };

        let actual = value.type_name();
        let views = checker.views_of(actual);
        checker.add_variable(name.as_str(), actual, views);

        let expected = PrimitiveType::parse(&info.ty).map_or(info.ty.as_str(), |ty| ty.name());

        if !checker.is_evaluable(name, expected) {
            error!(
                "{}: field `{}` declared as `{}` holds `{}`",
                scope.unit(),
                name,
                info.ty,
                actual
            );
            return Err(ValidationError::IncompatibleType {
                field: name.clone(),
                declared: info.ty.clone(),
                actual: actual.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation;
    use crate::value::Value;
    use assert_matches::assert_matches;

    fn scope(variables: &[(&str, Value)]) -> Scope {
        let mut scope = Scope::root("test:f");

        for (name, value) in variables {
            scope.set(*name, value.clone());
        }

        scope
    }

    #[test]
    fn field_of_declared_type() {
        let fields = annotation::extract("@field resultat: Entier\n").fields;
        let scope = scope(&[("resultat", Value::Integer(8))]);

        assert_matches!(validate(&fields, &scope), Ok(()));
    }

    #[test]
    fn primitive_alias() {
        let fields = annotation::extract("@field total: int\n@field name: String\n").fields;
        let scope = scope(&[("total", Value::Integer(8)), ("name", Value::from("x"))]);

        assert_matches!(validate(&fields, &scope), Ok(()));
    }

    #[test]
    fn missing_field() {
        let fields = annotation::extract("@field resultat: Entier\n").fields;
        let scope = scope(&[]);

        assert_matches!(
            validate(&fields, &scope),
            Err(ValidationError::MissingField { field, declared }) => {
                assert_eq!(field, "resultat");
                assert_eq!(declared, "Entier");
            }
        );
    }

    #[test]
    fn incompatible_type() {
        let fields = annotation::extract("@field resultat: Entier\n").fields;
        let scope = scope(&[("resultat", Value::from("8"))]);

        assert_matches!(
            validate(&fields, &scope),
            Err(ValidationError::IncompatibleType { field, declared, actual }) => {
                assert_eq!(field, "resultat");
                assert_eq!(declared, "Entier");
                assert_eq!(actual, "Chaine");
            }
        );
    }

    #[test]
    fn view_makes_type_evaluable() {
        let fields = annotation::extract("@view montant: Somme\n@field total: Somme\n").fields;
        let scope = scope(&[("montant", Value::Integer(3)), ("total", Value::Integer(5))]);

        assert_matches!(validate(&fields, &scope), Ok(()));
    }

    #[test]
    fn view_does_not_leak_to_other_types() {
        let fields = annotation::extract("@view montant: Somme\n@field label: Somme\n").fields;
        let scope = scope(&[("montant", Value::Integer(3)), ("label", Value::from("x"))]);

        assert_matches!(
            validate(&fields, &scope),
            Err(ValidationError::IncompatibleType { field, .. }) => assert_eq!(field, "label")
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        let fields = annotation::extract("@field total: Montant\n").fields;
        let scope = scope(&[("total", Value::Integer(3))]);

        assert_matches!(
            validate(&fields, &scope),
            Err(ValidationError::IncompatibleType { .. })
        );
    }
}
