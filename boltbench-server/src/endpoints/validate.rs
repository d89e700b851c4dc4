use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::{Json, Router, routing};
use boltbench_service::validate::{Validation, validate_object};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::ServiceState;

pub fn router() -> Router<ServiceState> {
    Router::new().route("/validate", routing::post(validate))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ValidateRequest {
    bucket: String,
    key: String,
    /// `ON` if the object was removed from the baseline store, case-insensitive.
    bucket_clean: String,
}

impl ValidateRequest {
    fn is_bucket_clean(&self) -> bool {
        self.bucket_clean.eq_ignore_ascii_case("on")
    }
}

/// Compares the content hashes of one object on both stores.
async fn validate(
    State(state): State<ServiceState>,
    request: Result<Json<ValidateRequest>, JsonRejection>,
) -> ApiResult<Json<Validation>> {
    let Json(request) = request?;
    if request.bucket.is_empty() || request.key.is_empty() {
        return Err(ApiError::BadRequest("bucket and key are required".into()));
    }

    let validation = validate_object(
        state.backends.baseline(),
        state.backends.proxy(),
        &request.bucket,
        &request.key,
        request.is_bucket_clean(),
    )
    .await?;

    Ok(Json(validation))
}
