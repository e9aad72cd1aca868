//! Grammar
//! -------
//!
//! ```ignore
//! Program        := Statement*
//! Statement      := IfStatement | Block | Expression ";"?
//! IfStatement    := "if" "(" Expression ")" Block ("else" (Block | IfStatement))?
//! Block          := "{" Statement* "}"
//! Expression     := Assignment
//! Assignment     := Id "=" Assignment | Conditional
//! Conditional    := LogicalOr ("?" Expression ":" Expression)?
//! LogicalOr      := LogicalAnd ("||" LogicalAnd)*
//! LogicalAnd     := Equality ("&&" Equality)*
//! Equality       := Relational (("==" | "!=") Relational)*
//! Relational     := Additive (("<" | "<=" | ">" | ">=") Additive)*
//! Additive       := Multiplicative (("+" | "-") Multiplicative)*
//! Multiplicative := Unary (("*" | "/" | "%") Unary)*
//! Unary          := ("!" | "-") Unary | Primary
//! Primary        := Literal | CallExpression | Id | "(" Expression ")"
//! CallExpression := (QualifiedName | Id) "(" (Argument ",")* Argument? ")"
//! Argument       := Id ":" Expression | Expression
//! QualifiedName  := <Id ("." Id)* ":" Id, no whitespace, followed by "(">
//! Literal        := <Integer> | <Decimal> | <String> | "Vrai" | "Faux" | "null"
//! ```
use std::fmt;

/// A parsed unit body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(Literal),
    Identifier(String),
    Assignment {
        name: String,
        value: Box<Node>,
    },
    Call(CallExpression),
    If {
        condition: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Option<Box<Node>>,
    },
    Conditional {
        condition: Box<Node>,
        then_value: Box<Node>,
        else_value: Box<Node>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Node>,
    },
    Binary {
        operator: BinaryOperator,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Block(Vec<Node>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Integer,
    Decimal,
    String,
    Boolean,
    Null,
}

/// A literal as written in source. `text` is coerced by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub text: String,
}

impl Literal {
    pub fn new<S: Into<String>>(kind: LiteralKind, text: S) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub namespace: Option<String>,
    pub name: String,
    pub arguments: Vec<Argument>,
}

impl CallExpression {
    /// `namespace:name`, or the bare name for unqualified calls.
    pub fn callee(&self) -> String {
        match self.namespace {
            Some(ref namespace) => format!("{}:{}", namespace, self.name),
            None => self.name.clone(),
        }
    }
}

/// `name: value`. Positional arguments have no name and are rejected at
/// evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Minus => write!(f, "-"),
            UnaryOperator::Not => write!(f, "!"),
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOperator::Add => write!(f, "+"),
            BinaryOperator::Sub => write!(f, "-"),
            BinaryOperator::Mul => write!(f, "*"),
            BinaryOperator::Div => write!(f, "/"),
            BinaryOperator::Rem => write!(f, "%"),
            BinaryOperator::Lt => write!(f, "<"),
            BinaryOperator::Gt => write!(f, ">"),
            BinaryOperator::Le => write!(f, "<="),
            BinaryOperator::Ge => write!(f, ">="),
            BinaryOperator::Eq => write!(f, "=="),
            BinaryOperator::Ne => write!(f, "!="),
            BinaryOperator::And => write!(f, "&&"),
            BinaryOperator::Or => write!(f, "||"),
        }
    }
}
