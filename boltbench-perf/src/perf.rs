//! Entry point of a benchmark run.

use crate::backends::Backends;
use crate::error::BenchResult;
use crate::keys::WorkingSet;
use crate::payload::PayloadGenerator;
use crate::phases;
use crate::report::BenchmarkReport;
use crate::request::{BenchmarkRequest, OperationKind};
use crate::runner::ReadMode;

/// Runs the workload described by `request` and returns its report.
///
/// Read workloads operate on keys discovered from the baseline store, so both stores are read with
/// identical keys. An unrecognized operation yields an empty report without contacting either
/// store.
pub async fn run(request: &BenchmarkRequest, backends: &Backends) -> BenchResult<BenchmarkReport> {
    let Some(operation) = request.operation else {
        tracing::info!(bucket = %request.bucket, "unknown request type, nothing to run");
        return Ok(BenchmarkReport::new());
    };

    tracing::info!(%operation, bucket = %request.bucket, "starting benchmark");
    let bucket = request.bucket.as_str();
    let limit = request.key_count_limit;

    let report = match operation {
        OperationKind::List => {
            phases::list(backends, bucket, request.list_iterations, limit).await?
        }
        OperationKind::Put => {
            let payloads = PayloadGenerator::new(request.payload_length);
            phases::put(backends, bucket, &WorkingSet::generate(limit), &payloads).await?
        }
        OperationKind::Delete => {
            phases::delete(backends, bucket, &WorkingSet::generate(limit)).await?
        }
        OperationKind::Get | OperationKind::GetTtfb => {
            let keys = WorkingSet::discover(backends.baseline(), bucket, limit).await?;
            phases::get(backends, bucket, &keys, read_mode(operation)).await?
        }
        OperationKind::GetPassthrough | OperationKind::GetPassthroughTtfb => {
            let keys = WorkingSet::discover(backends.baseline(), bucket, limit).await?;
            phases::get_passthrough(backends, bucket, &keys, read_mode(operation)).await?
        }
        OperationKind::All => run_all(request, backends).await?,
    };

    tracing::info!(%operation, blocks = report.len(), "benchmark finished");
    Ok(report)
}

fn read_mode(operation: OperationKind) -> ReadMode {
    match operation {
        OperationKind::GetTtfb | OperationKind::GetPassthroughTtfb => ReadMode::FirstByte,
        _ => ReadMode::Full,
    }
}

/// Runs put, delete, list and get in this order and merges their reports.
///
/// The get phase discovers its keys after the delete phase, so it reads whatever the bucket holds
/// at that point. The first failing phase aborts the run.
async fn run_all(request: &BenchmarkRequest, backends: &Backends) -> BenchResult<BenchmarkReport> {
    let bucket = request.bucket.as_str();
    let limit = request.key_count_limit;

    let generated = WorkingSet::generate(limit);
    let payloads = PayloadGenerator::new(request.payload_length);

    let mut report = phases::put(backends, bucket, &generated, &payloads).await?;
    report.merge(phases::delete(backends, bucket, &generated).await?);
    report.merge(phases::list(backends, bucket, request.list_iterations, limit).await?);

    let discovered = WorkingSet::discover(backends.baseline(), bucket, limit).await?;
    report.merge(phases::get(backends, bucket, &discovered, ReadMode::Full).await?);

    Ok(report)
}
