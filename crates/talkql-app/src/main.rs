//! TalkQL application binary - composition root.
//!
//! Ties together all TalkQL crates into a single executable:
//! 1. Load `.env` and CLI arguments
//! 2. Initialize tracing
//! 3. Load configuration from TOML and required secrets from the environment
//! 4. Open the SQLite database and build the executor
//! 5. Construct the LLM client and the query orchestrator
//! 6. Start the axum API server

mod cli;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use talkql_api::routes::start_server;
use talkql_api::AppState;
use talkql_chat::QueryOrchestrator;
use talkql_core::{Secrets, TalkqlConfig};
use talkql_db::{Database, SqliteExecutor};
use talkql_llm::OpenAiClient;

use cli::CliArgs;

/// Expand ~ to the home directory in a path string.
fn resolve_path(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(raw)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Secrets may live in a local .env during development.
    dotenv::dotenv().ok();

    let args = CliArgs::parse();

    // Tracing. RUST_LOG wins, then the --log-level flag.
    let log_level = args.resolve_log_level("info");
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!("Starting TalkQL v{}", env!("CARGO_PKG_VERSION"));

    // Config.
    let config_path = args.resolve_config_path();
    let config = TalkqlConfig::load_or_default(&config_path);
    tracing::info!(path = %config_path.display(), "Configuration loaded");

    // Secrets. Missing either one is fatal: without the API token nobody can
    // authenticate, and without the LLM key no SQL can ever be generated.
    let secrets = match Secrets::from_env() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Startup aborted: required secret missing");
            return Err(e.into());
        }
    };

    // Database.
    let db_path = resolve_path(&config.database.path);
    let db = Database::new(
        &db_path,
        Duration::from_millis(config.database.busy_timeout_ms),
    )?;
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    let executor = Arc::new(SqliteExecutor::new(Arc::new(db)));

    // LLM client.
    let llm = Arc::new(OpenAiClient::new(secrets.llm_api_key.clone(), &config.llm));
    tracing::info!(model = %config.llm.model, "LLM client ready");

    // Orchestrator and API state.
    let orchestrator = Arc::new(QueryOrchestrator::new(
        llm,
        executor,
        &config.chat,
        &config.schema.ddl,
    ));
    let state = AppState::new(orchestrator, secrets.api_token.clone());

    // Serve.
    let port = args.resolve_port(config.server.port);
    start_server(port, state).await?;

    Ok(())
}
