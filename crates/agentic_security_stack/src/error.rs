use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while constructing a stack. Construction is pure, so none of
/// these are retryable with the same inputs.
#[derive(Debug, Error)]
pub enum StackError {
    #[error("configuration error for '{}': {message}", .path.display())]
    Configuration { path: PathBuf, message: String },

    #[error("naming conflict: '{name}' is already taken in {scope}")]
    NamingConflict { name: String, scope: String },

    #[error("validation error: {0}")]
    Validation(String),
}

impl StackError {
    pub fn configuration(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Configuration {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, StackError>;
