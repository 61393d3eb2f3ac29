//! API error types and JSON error response formatting.
//!
//! Every turn-terminating chat error is converted into a user-visible JSON
//! message with an appropriate status code; nothing surfaces as a bare 500
//! with no body. Messages also say whether the conversation survived, so
//! the user knows if retrying the same turn is safe.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use talkql_chat::ChatError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 422 Unprocessable Entity - the generated SQL was rejected.
    UnprocessableEntity(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
    /// 503 Service Unavailable - upstream model failure; safe to retry.
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::UnprocessableEntity(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_entity", msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            }
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage | ChatError::MessageTooLong(_) => {
                ApiError::BadRequest(err.to_string())
            }
            ChatError::SessionNotFound(id) => {
                ApiError::NotFound(format!("no active query session: {}", id))
            }
            ChatError::LlmUnavailable(msg) => ApiError::ServiceUnavailable(format!(
                "Sorry — the language model could not be reached ({}). \
                 Your conversation is unchanged; please try again.",
                msg
            )),
            ChatError::MalformedResponse(msg) => ApiError::ServiceUnavailable(format!(
                "Sorry — the model's reply could not be understood ({}). \
                 Your conversation is unchanged; please send your request again.",
                msg
            )),
            ChatError::SqlExecution { statement, message } => {
                ApiError::UnprocessableEntity(format!(
                    "Sorry — the database rejected the generated SQL (`{}`): {}. \
                     Please start a new query.",
                    statement, message
                ))
            }
            ChatError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}
