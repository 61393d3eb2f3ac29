//! HTTP transport for TalkQL.
//!
//! Exposes the conversational core over an axum API: start a query,
//! continue it with follow-up messages, inspect or cancel a session.
//! All non-health routes sit behind bearer-token authentication.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
