use super::builtins::Builtin;
use super::evaluator::Evaluator;
use super::{ArgumentError, NamedArgs, RuntimeError};
use crate::annotation::ParameterSet;
use crate::loader::{Library, UnitDescriptor};
use crate::semantic::{self, Scope};
use crate::util::wrap;
use crate::value::Value;
use log::{debug, error, warn};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Names read, in order, for the result of a unit.
const RESULT_NAMES: [&str; 2] = ["resultat", "result"];

/// Runs functions of a loaded library.
///
/// Cheap to clone. Every `invoke` is an independent root invocation with its
/// own call stack and scopes, so one interpreter can serve several threads.
#[derive(Debug, Clone)]
pub struct Interpreter {
    library: Arc<Library>,
}

impl Interpreter {
    pub fn new(library: Arc<Library>) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn invoke(&self, name: &str, args: NamedArgs) -> Result<Value, RuntimeError> {
        let mut invocation = Invocation::new(&self.library);
        invocation.call(name, args)
    }
}

impl From<Library> for Interpreter {
    fn from(library: Library) -> Self {
        Self::new(Arc::new(library))
    }
}

/// State of one root invocation: the names currently mid-call.
pub(crate) struct Invocation<'l> {
    library: &'l Library,
    stack: Vec<String>,
}

impl<'l> Invocation<'l> {
    fn new(library: &'l Library) -> Self {
        Self {
            library,
            stack: vec![],
        }
    }

    pub(crate) fn call(&mut self, name: &str, args: NamedArgs) -> Result<Value, RuntimeError> {
        if self.stack.iter().any(|running| running == name) {
            error!("call cycle: `{}` from {:?}", name, self.stack);
            return Err(RuntimeError::CallCycle {
                name: name.to_string(),
                stack: self.stack.clone(),
            });
        }

        let library = self.library;
        let unit = match library.get(name) {
            Some(unit) => unit,
            None => return call_builtin(name, args),
        };

        check_arguments(name, unit.parameters(), &args)?;

        debug!("-> {} {:?}", name, args);
        self.stack.push(name.to_string());
        let result = self.execute(unit, args);
        self.stack.pop();

        let (scope, last) = result?;
        let scope = scope.borrow();

        semantic::validate(unit.fields(), &scope)?;

        let value = match result_of(&scope, last) {
            Some(value) => value,
            None => {
                warn!("`{}` produced no result", name);
                return Err(RuntimeError::NoResult(name.to_string()));
            }
        };

        debug!("<- {} = {}", name, value);
        Ok(value)
    }

    fn execute(
        &mut self,
        unit: &UnitDescriptor,
        args: NamedArgs,
    ) -> Result<(Rc<RefCell<Scope>>, Option<Value>), RuntimeError> {
        let scope = wrap(Scope::root(unit.name()));

        for (name, value) in args {
            scope.borrow_mut().set(name, value);
        }

        let last = Evaluator::new(self, Rc::clone(&scope)).run(unit.program())?;

        Ok((scope, last))
    }
}

fn call_builtin(name: &str, args: NamedArgs) -> Result<Value, RuntimeError> {
    let builtin = match Builtin::lookup(name) {
        Some(builtin) => builtin,
        None => {
            error!("unknown function `{}`", name);
            return Err(RuntimeError::UnknownFunction(name.to_string()));
        }
    };

    check_arguments(name, &builtin.parameters(), &args)?;
    debug!("-> builtin {} {:?}", name, args);

    builtin.call(args)
}

/// Every argument must be declared, every required parameter must be passed.
pub fn check_arguments(
    function: &str,
    parameters: &ParameterSet,
    args: &NamedArgs,
) -> Result<(), ArgumentError> {
    if let Some(name) = args.keys().find(|name| !parameters.contains(name)) {
        error!("`{}`: unknown argument `{}`", function, name);
        return Err(ArgumentError::Unknown {
            function: function.to_string(),
            name: name.clone(),
        });
    }

    if let Some(name) = parameters.required().find(|name| !args.contains_key(*name)) {
        error!("`{}`: missing argument `{}`", function, name);
        return Err(ArgumentError::Missing {
            function: function.to_string(),
            name: name.to_string(),
        });
    }

    Ok(())
}

// The final scope is the root scope, so only root bindings are visible here.
fn result_of(scope: &Scope, last: Option<Value>) -> Option<Value> {
    RESULT_NAMES
        .iter()
        .find_map(|name| scope.get(name))
        .or_else(|| last.filter(|value| !value.is_null()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Loader;
    use crate::semantic::ValidationError;
    use assert_matches::assert_matches;

    fn interpreter(units: &[(&str, &str)]) -> Interpreter {
        let mut loader = Loader::new();

        for (name, source) in units {
            loader.load_source(*name, source).unwrap();
        }
        loader.detect_cycles();

        Interpreter::from(loader.into_library().unwrap())
    }

    fn args(pairs: &[(&str, Value)]) -> NamedArgs {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    const ADD: &str = "\
@name test:add
@arg first Entier
@arg second Entier
@field resultat Entier
resultat = first + second;
";

    #[test]
    fn invoke_add() {
        let interpreter = interpreter(&[("test:add", ADD)]);
        let result = interpreter.invoke(
            "test:add",
            args(&[("first", Value::Integer(3)), ("second", Value::Integer(5))]),
        );

        assert_eq!(result, Ok(Value::Integer(8)));
    }

    #[test]
    fn missing_required_argument() {
        let interpreter = interpreter(&[("test:add", ADD)]);
        let result = interpreter.invoke("test:add", args(&[("first", Value::Integer(3))]));

        assert_matches!(
            result,
            Err(RuntimeError::Argument(ArgumentError::Missing { function, name })) => {
                assert_eq!(function, "test:add");
                assert_eq!(name, "second");
            }
        );
    }

    #[test]
    fn unknown_argument() {
        let interpreter = interpreter(&[("test:add", ADD)]);
        let result = interpreter.invoke(
            "test:add",
            args(&[
                ("first", Value::Integer(3)),
                ("second", Value::Integer(5)),
                ("extra", Value::Integer(1)),
            ]),
        );

        assert_matches!(
            result,
            Err(RuntimeError::Argument(ArgumentError::Unknown { name, .. })) => {
                assert_eq!(name, "extra");
            }
        );
    }

    #[test]
    fn optional_argument_may_be_omitted() {
        let interpreter = interpreter(&[(
            "test:greet",
            "@arg name Chaine\n@optional\n@arg greeting Chaine\n\
             resultat = (greeting == null ? \"Bonjour\" : greeting) + \" \" + name;\n",
        )]);

        assert_eq!(
            interpreter.invoke("test:greet", args(&[("name", Value::from("Ada"))])),
            Ok(Value::from("Bonjour Ada"))
        );
        assert_eq!(
            interpreter.invoke(
                "test:greet",
                args(&[("name", Value::from("Ada")), ("greeting", Value::from("Salut"))])
            ),
            Ok(Value::from("Salut Ada"))
        );
    }

    #[test]
    fn runtime_call_cycle() {
        // Cycles are introduced after the load-time check so that only the
        // call stack can catch them.
        let mut loader = Loader::new();
        loader
            .load_source("test:a", "@arg n\nresultat = test:b(n: n);\n")
            .unwrap();
        loader
            .load_source("test:b", "@arg n\nresultat = test:a(n: n);\n")
            .unwrap();
        let library = loader.into_library().unwrap();

        let interpreter = Interpreter::from(library);
        let result = interpreter.invoke("test:a", args(&[("n", Value::Integer(1))]));

        assert_matches!(result, Err(RuntimeError::CallCycle { name, stack }) => {
            assert_eq!(name, "test:a");
            assert_eq!(stack, vec!["test:a".to_string(), "test:b".to_string()]);
        });
    }

    #[test]
    fn repeated_sequential_calls_are_not_cycles() {
        let interpreter = interpreter(&[
            ("test:add", ADD),
            (
                "test:twice",
                "@arg x\nresultat = test:add(first: x, second: x) + test:add(first: x, second: 1);\n",
            ),
        ]);

        assert_eq!(
            interpreter.invoke("test:twice", args(&[("x", Value::Integer(2))])),
            Ok(Value::Integer(7))
        );
    }

    #[test]
    fn builtins() {
        let interpreter = interpreter(&[(
            "test:sum",
            "@arg a\n@arg b\nprint(message: \"sum\");\nresultat = math:add(first: a, second: b);\n",
        )]);

        assert_eq!(
            interpreter.invoke(
                "test:sum",
                args(&[("a", Value::Integer(2)), ("b", Value::Integer(40))])
            ),
            Ok(Value::Integer(42))
        );
    }

    #[test]
    fn builtin_arguments_are_checked() {
        let interpreter = interpreter(&[]);

        assert_matches!(
            interpreter.invoke("math:add", args(&[("first", Value::Integer(1))])),
            Err(RuntimeError::Argument(ArgumentError::Missing { .. }))
        );
    }

    #[test]
    fn unknown_function() {
        let interpreter = interpreter(&[("test:a", "resultat = test:missing(x: 1);\n")]);

        assert_matches!(
            interpreter.invoke("test:a", NamedArgs::new()),
            Err(RuntimeError::UnknownFunction(name)) => assert_eq!(name, "test:missing")
        );
    }

    #[test]
    fn last_value_is_the_fallback_result() {
        let interpreter = interpreter(&[("test:f", "@arg x\nx * 2;\n")]);

        assert_eq!(
            interpreter.invoke("test:f", args(&[("x", Value::Integer(21))])),
            Ok(Value::Integer(42))
        );
    }

    #[test]
    fn result_name() {
        let interpreter = interpreter(&[("test:f", "result = \"ok\";\nx = 1;\n")]);

        assert_eq!(
            interpreter.invoke("test:f", NamedArgs::new()),
            Ok(Value::from("ok"))
        );
    }

    #[test]
    fn no_result() {
        let interpreter = interpreter(&[("test:f", "print(message: \"nothing\");\n")]);

        assert_matches!(
            interpreter.invoke("test:f", NamedArgs::new()),
            Err(RuntimeError::NoResult(name)) => assert_eq!(name, "test:f")
        );
    }

    #[test]
    fn field_validation() {
        let interpreter = interpreter(&[
            ("test:missing", "@field resultat: Entier\nx = 1;\n"),
            ("test:wrong", "@field resultat: Entier\nresultat = \"8\";\n"),
        ]);

        assert_matches!(
            interpreter.invoke("test:missing", NamedArgs::new()),
            Err(RuntimeError::Validation(ValidationError::MissingField { field, .. })) => {
                assert_eq!(field, "resultat");
            }
        );
        assert_matches!(
            interpreter.invoke("test:wrong", NamedArgs::new()),
            Err(RuntimeError::Validation(ValidationError::IncompatibleType { declared, actual, .. })) => {
                assert_eq!(declared, "Entier");
                assert_eq!(actual, "Chaine");
            }
        );
    }

    #[test]
    fn view_validation() {
        let interpreter = interpreter(&[(
            "test:price",
            "@arg amount\n@view amount: Montant\n@field resultat: Montant\nresultat = amount * 2;\n",
        )]);

        assert_eq!(
            interpreter.invoke("test:price", args(&[("amount", Value::Integer(4))])),
            Ok(Value::Integer(8))
        );
    }

    #[test]
    fn positional_argument_is_rejected() {
        let interpreter = interpreter(&[("test:add", ADD), ("test:f", "resultat = test:add(1, 2);\n")]);

        assert_matches!(
            interpreter.invoke("test:f", NamedArgs::new()),
            Err(RuntimeError::Argument(ArgumentError::Positional { function })) => {
                assert_eq!(function, "test:add");
            }
        );
    }

    #[test]
    fn duplicate_argument_is_rejected() {
        let interpreter = interpreter(&[
            ("test:add", ADD),
            ("test:f", "resultat = test:add(first: 1, first: 2, second: 3);\n"),
        ]);

        assert_matches!(
            interpreter.invoke("test:f", NamedArgs::new()),
            Err(RuntimeError::Argument(ArgumentError::Duplicate { name, .. })) => {
                assert_eq!(name, "first");
            }
        );
    }

    #[test]
    fn callee_scope_is_isolated() {
        let interpreter = interpreter(&[
            ("test:inner", "@arg v\nsecret = 1;\nresultat = v;\n"),
            (
                "test:outer",
                "x = test:inner(v: 5);\nresultat = secret == null ? x : -1;\n",
            ),
        ]);

        assert_eq!(
            interpreter.invoke("test:outer", NamedArgs::new()),
            Ok(Value::Integer(5))
        );
    }

    #[test]
    fn nested_block_scoping() {
        let interpreter = interpreter(&[(
            "test:f",
            "x = 1;\n{\n  { x = 2; y = 3; }\n  resultat = x + (y == null ? 10 : 0);\n}\n",
        )]);

        // The inner block shadows `x` and binds `y` locally.
        assert_eq!(
            interpreter.invoke("test:f", NamedArgs::new()),
            Ok(Value::Integer(11))
        );
    }

    #[test]
    fn branch_assigns_result() {
        let interpreter = interpreter(&[(
            "test:abs",
            "@arg n Entier\n@field resultat Entier\n\
             if (n < 0) { resultat = 0 - n; } else { resultat = n; }\n",
        )]);

        assert_eq!(
            interpreter.invoke("test:abs", args(&[("n", Value::Integer(-3))])),
            Ok(Value::Integer(3))
        );
        assert_eq!(
            interpreter.invoke("test:abs", args(&[("n", Value::Integer(4))])),
            Ok(Value::Integer(4))
        );
    }

    #[test]
    fn branch_bindings_outlive_the_if() {
        let interpreter = interpreter(&[(
            "test:f",
            "@arg n\nif (n > 0) { x = 1; } else { x = 2; }\nresultat = x;\n",
        )]);

        assert_eq!(
            interpreter.invoke("test:f", args(&[("n", Value::Integer(-1))])),
            Ok(Value::Integer(2))
        );
    }

    #[test]
    fn library_unit_shadows_builtin() {
        let interpreter = interpreter(&[
            ("print", "@arg message\nresultat = \"> \" + message;\n"),
            ("test:f", "resultat = print(message: \"salut\");\n"),
        ]);

        assert_eq!(
            interpreter.invoke("test:f", NamedArgs::new()),
            Ok(Value::from("> salut"))
        );
    }

    #[test]
    fn if_else_value() {
        let interpreter = interpreter(&[(
            "test:sign",
            "@arg n\nif (n < 0) { \"negatif\"; } else if (n == 0) { \"zero\"; } else { \"positif\"; }\n",
        )]);

        assert_eq!(
            interpreter.invoke("test:sign", args(&[("n", Value::Integer(0))])),
            Ok(Value::from("zero"))
        );
        assert_eq!(
            interpreter.invoke("test:sign", args(&[("n", Value::Integer(-4))])),
            Ok(Value::from("negatif"))
        );
    }

    #[test]
    fn unsupported_operands_fail() {
        let interpreter = interpreter(&[("test:f", "resultat = 1 - \"a\";\n")]);

        assert_matches!(
            interpreter.invoke("test:f", NamedArgs::new()),
            Err(RuntimeError::Coercion(..))
        );
    }

    #[test]
    fn concurrent_root_invocations() {
        let interpreter = interpreter(&[("test:add", ADD)]);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let interpreter = interpreter.clone();
                std::thread::spawn(move || {
                    interpreter.invoke(
                        "test:add",
                        args(&[("first", Value::Integer(i)), ("second", Value::Integer(i))]),
                    )
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), Ok(Value::Integer(2 * i as i64)));
        }
    }
}
