//! CLI argument definitions for the TalkQL application.
//!
//! Uses `clap` with derive macros. Priority resolution:
//! CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// TalkQL, a conversational natural-language-to-SQL assistant.
#[derive(Parser, Debug)]
#[command(name = "talkql", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > TALKQL_CONFIG env var > ~/.talkql/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("TALKQL_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > TALKQL_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("TALKQL_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        config_port
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > fallback. RUST_LOG, when set, overrides
    /// both at subscriber setup.
    pub fn resolve_log_level(&self, fallback: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Default config location: `~/.talkql/config.toml`.
fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".talkql").join("config.toml");
    }
    PathBuf::from("config.toml")
}
