use super::engine::Invocation;
use super::{ArgumentError, CoercionError, NamedArgs, RuntimeError};
use crate::semantic::Scope;
use crate::syntax::{
    BinaryOperator, CallExpression, Literal, LiteralKind, Node, Program, UnaryOperator,
};
use crate::util::wrap;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

type EvalResult = Result<Value, RuntimeError>;

/// Walks the tree of one unit against its scope chain.
///
/// Calls are delegated back to the invocation that created the evaluator.
pub struct Evaluator<'a, 'l> {
    invocation: &'a mut Invocation<'l>,
    scope: Rc<RefCell<Scope>>,
}

impl<'a, 'l> Evaluator<'a, 'l> {
    pub fn new(invocation: &'a mut Invocation<'l>, scope: Rc<RefCell<Scope>>) -> Self {
        Self { invocation, scope }
    }

    /// Runs a unit body and returns the value of its last statement.
    ///
    /// Top-level statements, the statements of a top-level `{ ... }` body
    /// included, run in the root scope.
    pub fn run(&mut self, program: &Program) -> Result<Option<Value>, RuntimeError> {
        let mut last = None;

        for node in &program.body {
            let value = match node {
                Node::Block(statements) => self.evaluate_statements(statements)?,
                node => self.evaluate(node)?,
            };

            last = Some(value);
        }

        Ok(last)
    }

    pub fn evaluate(&mut self, node: &Node) -> EvalResult {
        match node {
            Node::Literal(literal) => Ok(coerce_literal(literal)?),
            Node::Identifier(name) => Ok(self.lookup(name)),
            Node::Assignment { name, value } => {
                let value = self.evaluate(value)?;
                self.scope.borrow_mut().set(name.as_str(), value.clone());

                Ok(value)
            }
            Node::Call(call) => self.evaluate_call(call),
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate_branch(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.evaluate_branch(else_branch)
                } else {
                    Ok(Value::Null)
                }
            }
            Node::Conditional {
                condition,
                then_value,
                else_value,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_value)
                } else {
                    self.evaluate(else_value)
                }
            }
            Node::Unary { operator, operand } => {
                let operand = self.evaluate(operand)?;
                Ok(unary_op(*operator, operand)?)
            }
            Node::Binary { operator, lhs, rhs } => self.evaluate_binary(*operator, lhs, rhs),
            Node::Block(statements) => self.evaluate_in_local_scope(statements),
        }
    }

    // Unresolved identifiers read as null.
    fn lookup(&self, name: &str) -> Value {
        match self.scope.borrow().get(name) {
            Some(value) => value,
            None => {
                debug!(
                    "{}: `{}` is not bound, reads as null",
                    self.scope.borrow().unit(),
                    name
                );
                Value::Null
            }
        }
    }

    fn evaluate_statements(&mut self, statements: &[Node]) -> EvalResult {
        let mut last = Value::Null;

        for statement in statements {
            last = self.evaluate(statement)?;
        }

        Ok(last)
    }

    fn evaluate_in_local_scope(&mut self, statements: &[Node]) -> EvalResult {
        let local = wrap(Scope::local(&self.scope));
        let parent = mem::replace(&mut self.scope, local);

        let result = self.evaluate_statements(statements);
        self.scope = parent;

        result
    }

    // Branch bodies share the enclosing scope, so their bindings outlive the `if`.
    fn evaluate_branch(&mut self, branch: &Node) -> EvalResult {
        match branch {
            Node::Block(statements) => self.evaluate_statements(statements),
            // `else if`
            node => self.evaluate(node),
        }
    }

    fn evaluate_call(&mut self, call: &CallExpression) -> EvalResult {
        let callee = call.callee();
        let mut args = NamedArgs::new();

        for argument in &call.arguments {
            let name = match argument.name {
                Some(ref name) => name,
                None => {
                    return Err(ArgumentError::Positional {
                        function: callee,
                    }
                    .into())
                }
            };

            if args.contains_key(name) {
                return Err(ArgumentError::Duplicate {
                    function: callee,
                    name: name.clone(),
                }
                .into());
            }

            let value = self.evaluate(&argument.value)?;
            args.insert(name.clone(), value);
        }

        self.invocation.call(&callee, args)
    }

    fn evaluate_binary(&mut self, operator: BinaryOperator, lhs: &Node, rhs: &Node) -> EvalResult {
        // short-circuit
        match operator {
            BinaryOperator::And => {
                if !self.evaluate(lhs)?.is_truthy() {
                    return Ok(Value::Boolean(false));
                }
                return Ok(Value::Boolean(self.evaluate(rhs)?.is_truthy()));
            }
            BinaryOperator::Or => {
                if self.evaluate(lhs)?.is_truthy() {
                    return Ok(Value::Boolean(true));
                }
                return Ok(Value::Boolean(self.evaluate(rhs)?.is_truthy()));
            }
            _ => {}
        }

        let lhs = self.evaluate(lhs)?;
        let rhs = self.evaluate(rhs)?;

        Ok(binary_op(operator, lhs, rhs)?)
    }
}

pub fn coerce_literal(literal: &Literal) -> Result<Value, CoercionError> {
    let invalid = |kind| CoercionError::InvalidLiteral {
        kind,
        text: literal.text.clone(),
    };

    let value = match literal.kind {
        LiteralKind::Integer => Value::Integer(literal.text.parse().map_err(|_| invalid("integer"))?),
        LiteralKind::Decimal => Value::Decimal(literal.text.parse().map_err(|_| invalid("decimal"))?),
        LiteralKind::String => Value::String(unquote(&literal.text).ok_or_else(|| invalid("string"))?),
        LiteralKind::Boolean => match literal.text.as_str() {
            "Vrai" | "true" => Value::Boolean(true),
            "Faux" | "false" => Value::Boolean(false),
            _ => return Err(invalid("boolean")),
        },
        LiteralKind::Null => Value::Null,
    };

    Ok(value)
}

// Strips the quotes of a string literal and resolves its escapes.
fn unquote(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut string = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            string.push(c);
            continue;
        }

        match chars.next()? {
            'n' => string.push('\n'),
            'r' => string.push('\r'),
            't' => string.push('\t'),
            c @ ('"' | '\\') => string.push(c),
            _ => return None,
        }
    }

    Some(string)
}

fn unary_op(operator: UnaryOperator, operand: Value) -> Result<Value, CoercionError> {
    match (operator, &operand) {
        (UnaryOperator::Not, _) => Ok(Value::Boolean(!operand.is_truthy())),
        (UnaryOperator::Minus, Value::Integer(n)) => {
            n.checked_neg()
                .map(Value::Integer)
                .ok_or_else(|| CoercionError::Overflow {
                    operator: operator.to_string(),
                })
        }
        (UnaryOperator::Minus, Value::Decimal(n)) => Ok(Value::Decimal(-n)),
        (UnaryOperator::Minus, _) => Err(CoercionError::UnsupportedOperand {
            operator: operator.to_string(),
            operand: operand.type_name(),
        }),
    }
}

fn binary_op(operator: BinaryOperator, lhs: Value, rhs: Value) -> Result<Value, CoercionError> {
    let overflow = || CoercionError::Overflow {
        operator: operator.to_string(),
    };

    let value = match (operator, &lhs, &rhs) {
        (BinaryOperator::Eq, _, _) => Value::Boolean(lhs == rhs),
        (BinaryOperator::Ne, _, _) => Value::Boolean(lhs != rhs),

        (BinaryOperator::Add, Value::Integer(a), Value::Integer(b)) => {
            Value::Integer(a.checked_add(*b).ok_or_else(overflow)?)
        }
        (BinaryOperator::Add, Value::String(_), _) | (BinaryOperator::Add, _, Value::String(_)) => {
            Value::String(format!("{}{}", lhs, rhs))
        }
        (BinaryOperator::Sub, Value::Integer(a), Value::Integer(b)) => {
            Value::Integer(a.checked_sub(*b).ok_or_else(overflow)?)
        }
        (BinaryOperator::Mul, Value::Integer(a), Value::Integer(b)) => {
            Value::Integer(a.checked_mul(*b).ok_or_else(overflow)?)
        }
        (BinaryOperator::Div, Value::Integer(_), Value::Integer(0))
        | (BinaryOperator::Rem, Value::Integer(_), Value::Integer(0)) => {
            return Err(CoercionError::DivisionByZero)
        }
        (BinaryOperator::Div, Value::Integer(a), Value::Integer(b)) => {
            Value::Integer(a.checked_div(*b).ok_or_else(overflow)?)
        }
        (BinaryOperator::Rem, Value::Integer(a), Value::Integer(b)) => {
            Value::Integer(a.checked_rem(*b).ok_or_else(overflow)?)
        }

        (BinaryOperator::Lt, Value::Integer(a), Value::Integer(b)) => Value::Boolean(a < b),
        (BinaryOperator::Gt, Value::Integer(a), Value::Integer(b)) => Value::Boolean(a > b),
        (BinaryOperator::Le, Value::Integer(a), Value::Integer(b)) => Value::Boolean(a <= b),
        (BinaryOperator::Ge, Value::Integer(a), Value::Integer(b)) => Value::Boolean(a >= b),
        (BinaryOperator::Lt, Value::Decimal(a), Value::Decimal(b)) => Value::Boolean(a < b),
        (BinaryOperator::Gt, Value::Decimal(a), Value::Decimal(b)) => Value::Boolean(a > b),
        (BinaryOperator::Le, Value::Decimal(a), Value::Decimal(b)) => Value::Boolean(a <= b),
        (BinaryOperator::Ge, Value::Decimal(a), Value::Decimal(b)) => Value::Boolean(a >= b),

        _ => {
            return Err(CoercionError::UnsupportedOperands {
                operator: operator.to_string(),
                lhs: lhs.type_name(),
                rhs: rhs.type_name(),
            })
        }
    };

    Ok(value)
}
