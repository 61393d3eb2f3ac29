//! LLM capability for TalkQL.
//!
//! Defines the [`LlmClient`] trait the orchestrator calls through, plus an
//! OpenAI-style chat-completions implementation over HTTP.

pub mod client;
pub mod error;

pub use client::{LlmClient, OpenAiClient};
pub use error::LlmError;
