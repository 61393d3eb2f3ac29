//! API authentication via bearer tokens.
//!
//! Middleware validating `Authorization: Bearer <token>` headers on
//! protected endpoints against the token loaded at startup.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::state::AppState;

/// Middleware that validates Bearer token authentication.
///
/// Extracts the token from `Authorization: Bearer <token>` and compares
/// against `AppState.api_token`. Returns 401 if missing or invalid.
pub async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let auth_header = req.headers().get("authorization");

    match auth_header {
        Some(value) => {
            let value_str = match value.to_str() {
                Ok(s) => s,
                Err(_) => {
                    return unauthorized("Invalid Authorization header encoding");
                }
            };

            if let Some(token) = value_str.strip_prefix("Bearer ") {
                if token == state.api_token {
                    return next.run(req).await;
                }
            }

            unauthorized("Invalid bearer token")
        }
        None => unauthorized("Missing Authorization header"),
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "unauthorized",
            "message": message,
        })),
    )
        .into_response()
}
