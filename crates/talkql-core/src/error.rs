use thiserror::Error;

/// Top-level error type for the TalkQL system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for TalkqlError`
/// so that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TalkqlError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for TalkqlError {
    fn from(err: toml::de::Error) -> Self {
        TalkqlError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for TalkqlError {
    fn from(err: toml::ser::Error) -> Self {
        TalkqlError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TalkqlError {
    fn from(err: serde_json::Error) -> Self {
        TalkqlError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for TalkQL operations.
pub type Result<T> = std::result::Result<T, TalkqlError>;
