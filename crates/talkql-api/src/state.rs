//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use talkql_chat::QueryOrchestrator;

/// Shared application state, cheaply cloned into each handler task.
#[derive(Clone)]
pub struct AppState {
    /// The conversational core.
    pub orchestrator: Arc<QueryOrchestrator>,
    /// Bearer token callers must present.
    pub api_token: String,
    /// Server start time for uptime reporting.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new state around an orchestrator and the API token.
    pub fn new(orchestrator: Arc<QueryOrchestrator>, api_token: impl Into<String>) -> Self {
        Self {
            orchestrator,
            api_token: api_token.into(),
            start_time: Instant::now(),
        }
    }
}
