//! Error taxonomy for the conversational core.

use talkql_db::DbError;
use talkql_llm::LlmError;

/// Errors that terminate a conversation turn.
///
/// `LlmUnavailable` and `MalformedResponse` leave the session intact so the
/// user can retry the same turn, since no side effects happened. `SqlExecution`
/// clears the session: earlier statements in the batch are already
/// committed, so re-driving the stored state would duplicate them.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),
    #[error("SQL execution failed for `{statement}`: {message}")]
    SqlExecution { statement: String, message: String },
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<LlmError> for ChatError {
    fn from(err: LlmError) -> Self {
        ChatError::LlmUnavailable(err.to_string())
    }
}

impl From<DbError> for ChatError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Execution { statement, message } => {
                ChatError::SqlExecution { statement, message }
            }
            other => ChatError::Storage(other.to_string()),
        }
    }
}
