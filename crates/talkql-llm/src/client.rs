//! Chat-completions client.
//!
//! The orchestrator only sees the [`LlmClient`] trait; the concrete
//! [`OpenAiClient`] speaks the OpenAI-compatible `/chat/completions` wire
//! format, which most hosted and self-hosted providers accept.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use talkql_core::config::LlmConfig;

use crate::error::LlmError;

/// A capability that turns a prompt pair into raw model text.
///
/// One call per conversation turn. Implementations must not retry on their
/// own: a duplicated turn could duplicate SQL side effects downstream.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a system/user prompt pair and return the model's raw reply text.
    async fn generate(&self, system_prompt: &str, user_text: &str) -> Result<String, LlmError>;
}

/// OpenAI-compatible chat-completions client.
pub struct OpenAiClient {
    api_key: String,
    model: String,
    base_url: String,
    temperature: f64,
    request_timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client from configuration plus the API key secret.
    pub fn new(api_key: impl Into<String>, config: &LlmConfig) -> Self {
        Self {
            api_key: api_key.into(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            client: reqwest::Client::new(),
        }
    }

    /// Model identifier this client sends.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Base URL this client posts to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_completion(&self, system_prompt: &str, user_text: &str) -> Result<Value, LlmError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_text},
            ],
            "temperature": self.temperature,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(LlmError::Unavailable(format!("HTTP {}: {}", status, detail)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| LlmError::Unavailable(format!("invalid response body: {}", e)))
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, system_prompt: &str, user_text: &str) -> Result<String, LlmError> {
        let request = self.post_completion(system_prompt, user_text);
        let json = match tokio::time::timeout(self.request_timeout, request).await {
            Ok(result) => result?,
            Err(_) => return Err(LlmError::Timeout(self.request_timeout.as_secs())),
        };

        let text = extract_completion(&json)?;
        tracing::debug!(model = %self.model, reply_len = text.len(), "LLM completion received");
        Ok(text)
    }
}

/// Pull `choices[0].message.content` out of a chat-completions response.
pub fn extract_completion(json: &Value) -> Result<String, LlmError> {
    json.pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| LlmError::Parse("missing choices[0].message.content".to_string()))
}
