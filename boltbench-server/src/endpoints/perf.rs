use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::{Json, Router, routing};
use boltbench_perf::{BenchError, BenchmarkReport, BenchmarkRequest, PerfEvent};

use crate::error::ApiResult;
use crate::state::ServiceState;

pub fn router() -> Router<ServiceState> {
    Router::new().route("/perf", routing::post(perf))
}

/// Runs one benchmark and responds with its report.
///
/// The connection stays open until the whole workload has run.
async fn perf(
    State(state): State<ServiceState>,
    event: Result<Json<PerfEvent>, JsonRejection>,
) -> ApiResult<Json<BenchmarkReport>> {
    let Json(event) = event?;
    let request = BenchmarkRequest::try_from(&event).map_err(BenchError::from)?;

    let report = boltbench_perf::run(&request, &state.backends).await?;
    Ok(Json(report))
}
