//! Router setup with all API routes and middleware.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
///
/// `/health` is public; everything else requires the bearer token.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(handlers::health));

    let protected_routes = Router::new()
        .route("/query", post(handlers::start_query))
        .route("/sessions/{id}/messages", post(handlers::continue_query))
        .route(
            "/sessions/{id}",
            get(handlers::get_session).delete(handlers::cancel_session),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ));

    public_routes
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server on 127.0.0.1 at the given port.
pub async fn start_server(port: u16, state: AppState) -> Result<(), talkql_core::TalkqlError> {
    let addr = format!("127.0.0.1:{}", port);
    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| talkql_core::TalkqlError::Api(format!("failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| talkql_core::TalkqlError::Api(format!("server error: {}", e)))?;

    Ok(())
}
