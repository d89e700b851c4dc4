use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::{Json, Router, routing};
use boltbench_perf::Target;
use boltbench_service::ops::{OpsEvent, OpsResponse, SdkType, execute};

use crate::error::ApiResult;
use crate::state::ServiceState;

pub fn router() -> Router<ServiceState> {
    Router::new().route("/ops", routing::post(ops))
}

/// Issues a single request against the store selected by `sdkType`.
async fn ops(
    State(state): State<ServiceState>,
    event: Result<Json<OpsEvent>, JsonRejection>,
) -> ApiResult<Json<OpsResponse>> {
    let Json(event) = event?;

    let target = match SdkType::parse(&event.sdk_type) {
        SdkType::S3 => Target::Baseline,
        SdkType::Bolt => Target::Proxy,
    };

    let response = execute(state.backends.get(target), &event).await?;
    Ok(Json(response))
}
