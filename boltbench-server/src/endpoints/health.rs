use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Router, routing};

use crate::state::ServiceState;

/// Marker file whose presence fails the readiness check ahead of a shutdown.
pub const SHUTDOWN_MARKER_PATH: &str = "/tmp/boltbench.down";

pub fn router() -> Router<ServiceState> {
    Router::new()
        .route("/health", routing::get(health))
        .route("/ready", routing::get(ready))
}

async fn health() -> impl IntoResponse {
    "OK"
}

async fn ready() -> impl IntoResponse {
    let is_shutting_down = tokio::fs::try_exists(SHUTDOWN_MARKER_PATH)
        .await
        .unwrap_or(false);
    if is_shutting_down {
        tracing::debug!("Shutdown marker exists, failing readiness");
        return (StatusCode::SERVICE_UNAVAILABLE, "Shutting down");
    }

    (StatusCode::OK, "OK")
}
