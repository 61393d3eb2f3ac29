//! Error types for the database capability.

use thiserror::Error;

/// Errors from the database layer.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("failed to open database: {0}")]
    Open(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("statement failed: {statement}: {message}")]
    Execution { statement: String, message: String },
}

impl DbError {
    /// Wrap a driver error together with the statement that caused it.
    pub fn execution(statement: &str, err: impl std::fmt::Display) -> Self {
        DbError::Execution {
            statement: statement.to_string(),
            message: err.to_string(),
        }
    }
}
