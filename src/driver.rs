pub mod cli;
pub use cli::Command;

use crate::interpreter::{CoercionError, RuntimeError};
use crate::loader::LoadError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("invalid argument value: {0}")]
    ArgumentValue(#[from] CoercionError),

    #[error("invalid JSON arguments: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<String> for CommandError {
    fn from(message: String) -> Self {
        CommandError::InvalidOption(message)
    }
}
