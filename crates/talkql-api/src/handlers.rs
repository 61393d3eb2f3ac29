//! Route handler functions.
//!
//! Each handler extracts parameters via axum extractors, drives the
//! orchestrator, and returns JSON. Error conversion happens through
//! `ApiError`, which turns every turn failure into a user-visible message.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use talkql_chat::{SessionSnapshot, TurnReply};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    /// The user's natural-language message.
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TurnResponse {
    pub session_id: Uuid,
    /// Text to show the user: a follow-up question or formatted results.
    pub reply: String,
    /// True when SQL executed and the session was cleared.
    pub completed: bool,
}

impl From<TurnReply> for TurnResponse {
    fn from(reply: TurnReply) -> Self {
        Self {
            session_id: reply.session_id,
            reply: reply.message,
            completed: reply.completed,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    /// "gathering" or "resolved".
    pub phase: String,
    pub followup_rounds: usize,
    pub started_at: i64,
    pub last_message_at: i64,
}

impl From<SessionSnapshot> for SessionResponse {
    fn from(s: SessionSnapshot) -> Self {
        Self {
            session_id: s.session_id,
            phase: s.phase,
            followup_rounds: s.followup_rounds,
            started_at: s.started_at,
            last_message_at: s.last_message_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelResponse {
    pub session_id: Uuid,
    pub cancelled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /query: start a new query session with the first message.
pub async fn start_query(
    State(state): State<AppState>,
    Json(body): Json<MessageBody>,
) -> Result<Json<TurnResponse>, ApiError> {
    let reply = state.orchestrator.handle_turn(None, &body.text).await?;
    Ok(Json(reply.into()))
}

/// POST /sessions/{id}/messages: continue an in-progress query.
pub async fn continue_query(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(body): Json<MessageBody>,
) -> Result<Json<TurnResponse>, ApiError> {
    let reply = state
        .orchestrator
        .handle_turn(Some(session_id), &body.text)
        .await?;
    Ok(Json(reply.into()))
}

/// GET /sessions/{id}: snapshot of a live session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let snapshot = state.orchestrator.snapshot(session_id).await?;
    Ok(Json(snapshot.into()))
}

/// DELETE /sessions/{id}: explicit cancellation.
pub async fn cancel_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CancelResponse>, ApiError> {
    state.orchestrator.cancel(session_id)?;
    Ok(Json(CancelResponse {
        session_id,
        cancelled: true,
    }))
}

/// GET /health: unauthenticated liveness check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.orchestrator.active_sessions(),
    })
}
