use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::{Json, Router, routing};
use boltbench_service::autoheal::{AutoHeal, auto_heal};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::ServiceState;

pub fn router() -> Router<ServiceState> {
    Router::new().route("/autoheal", routing::post(autoheal))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AutoHealRequest {
    bucket: String,
    key: String,
}

/// Measures how long the proxy takes until it serves the object again.
///
/// This only returns once the proxy has served the object.
async fn autoheal(
    State(state): State<ServiceState>,
    request: Result<Json<AutoHealRequest>, JsonRejection>,
) -> ApiResult<Json<AutoHeal>> {
    let Json(request) = request?;
    if request.bucket.is_empty() || request.key.is_empty() {
        return Err(ApiError::BadRequest("bucket and key are required".into()));
    }

    let result = auto_heal(
        state.backends.proxy(),
        &request.bucket,
        &request.key,
        state.config.autoheal.retry_interval,
    )
    .await;

    Ok(Json(result))
}
