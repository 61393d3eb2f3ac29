use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TalkqlError};

/// Environment variable holding the API bearer token.
pub const API_TOKEN_ENV: &str = "TALKQL_API_TOKEN";
/// Environment variable holding the LLM API key.
pub const LLM_API_KEY_ENV: &str = "TALKQL_LLM_API_KEY";
/// Fallback environment variable for the LLM API key.
pub const LLM_API_KEY_FALLBACK_ENV: &str = "OPENAI_API_KEY";

/// Top-level configuration for the TalkQL application.
///
/// Loaded from `~/.talkql/config.toml` by default. Each section corresponds
/// to one subsystem. Secrets are never stored here; see [`Secrets`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TalkqlConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
}

impl TalkqlConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TalkqlConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to bind on 127.0.0.1.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8030 }
    }
}

/// LLM API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the chat-completions API.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Upper bound on a single request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            request_timeout_secs: 60,
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: String,
    /// How long a statement may wait on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "~/.talkql/talkql.db".to_string(),
            busy_timeout_ms: 5_000,
        }
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum inbound message length in characters.
    pub max_message_len: usize,
    /// Idle sessions older than this are discarded on next contact.
    pub session_timeout_minutes: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_len: 2000,
            session_timeout_minutes: 30,
        }
    }
}

/// Database schema description handed to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// DDL-like description of the tables the model may query.
    pub ddl: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            ddl: DEFAULT_SCHEMA_DDL.to_string(),
        }
    }
}

/// Default schema: a small student-management database.
pub const DEFAULT_SCHEMA_DDL: &str = "\
CREATE TABLE student (
    roll_no INTEGER PRIMARY KEY,
    s_name VARCHAR(30),
    address VARCHAR(60),
    contact_no VARCHAR(15)
);
CREATE TABLE registration (
    reg_id INTEGER PRIMARY KEY,
    roll_no INTEGER REFERENCES student(roll_no)
);
CREATE TABLE attendance (
    att_id INTEGER PRIMARY KEY,
    month INTEGER,
    year INTEGER,
    roll_no INTEGER REFERENCES student(roll_no)
);";

/// Secrets loaded from the environment at startup.
///
/// Both values are required; a missing secret is a fatal startup condition
/// rather than something to limp along without.
#[derive(Clone)]
pub struct Secrets {
    /// Bearer token callers must present to the HTTP API.
    pub api_token: String,
    /// API key for the LLM provider.
    pub llm_api_key: String,
}

impl Secrets {
    /// Read both secrets from the environment.
    ///
    /// The LLM key is read from `TALKQL_LLM_API_KEY`, falling back to
    /// `OPENAI_API_KEY` for compatibility with provider tooling.
    pub fn from_env() -> Result<Self> {
        let api_token = require_env(API_TOKEN_ENV)?;
        let llm_api_key = match non_empty_env(LLM_API_KEY_ENV) {
            Some(key) => key,
            None => require_env(LLM_API_KEY_FALLBACK_ENV).map_err(|_| {
                TalkqlError::Config(format!(
                    "missing required secret: set {} or {}",
                    LLM_API_KEY_ENV, LLM_API_KEY_FALLBACK_ENV
                ))
            })?,
        };
        Ok(Self {
            api_token,
            llm_api_key,
        })
    }
}

impl std::fmt::Debug for Secrets {
    // Never print secret material, even in debug logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("api_token", &"<redacted>")
            .field("llm_api_key", &"<redacted>")
            .finish()
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require_env(name: &str) -> Result<String> {
    non_empty_env(name)
        .ok_or_else(|| TalkqlError::Config(format!("missing required secret: {}", name)))
}
