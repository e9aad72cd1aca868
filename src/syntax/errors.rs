use super::tokenizer::{Position, Token, TokenError, TokenErrorKind};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("{kind} at {position}")]
pub struct ParseError {
    pub position: Position,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn syntax_error<S: Into<String>>(position: Position, message: S) -> Self {
        Self {
            position,
            kind: ParseErrorKind::SyntaxError(message.into()),
        }
    }

    pub fn mismatch_token<S: Into<String>>(token: &Token, expected: S) -> Self {
        Self {
            position: token.range.start,
            kind: ParseErrorKind::UnexpectedToken {
                expected: expected.into(),
                found: token.kind.to_string(),
            },
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("Syntax error: {0}")]
    SyntaxError(String),

    #[error("Syntax error: expected {expected}, but found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Syntax error: invalid left-hand side in assignment")]
    InvalidAssignmentTarget,
}

impl From<TokenError> for ParseError {
    fn from(err: TokenError) -> Self {
        match err.kind {
            TokenErrorKind::Error(message) => Self::syntax_error(err.position, message),
        }
    }
}
