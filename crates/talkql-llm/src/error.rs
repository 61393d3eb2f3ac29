//! Error types for the LLM capability.

use thiserror::Error;

/// Errors from the LLM client.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM unavailable: {0}")]
    Unavailable(String),
    #[error("LLM request timed out after {0}s")]
    Timeout(u64),
    #[error("unusable completion: {0}")]
    Parse(String),
}
