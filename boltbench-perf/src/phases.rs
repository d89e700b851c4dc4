//! Phase drivers: run one operation kind on both stores and name the results.
//!
//! Each driver benchmarks the baseline store first and the proxy second, then emits one statistic
//! block per store named `{store}_{operation}_perf_stats`. Read phases additionally emit a
//! `{store}Count` block. Passthrough reads only address the proxy.

use crate::backends::{Backends, Target};
use crate::error::BenchResult;
use crate::keys::WorkingSet;
use crate::payload::PayloadGenerator;
use crate::report::BenchmarkReport;
use crate::runner::{ReadMode, Runner, SampleSeries};

/// Returns the name of a statistic block.
pub fn stat_name(target: Target, operation: &str) -> String {
    format!("{}_{operation}_perf_stats", target.label())
}

/// Returns the name of an object count block.
pub fn count_name(target: Target) -> String {
    format!("{}Count", target.label())
}

fn read_operation(mode: ReadMode, passthrough: bool) -> &'static str {
    match (passthrough, mode) {
        (false, ReadMode::Full) => "get_obj",
        (false, ReadMode::FirstByte) => "get_obj_ttfb",
        (true, ReadMode::Full) => "get_obj_pt",
        (true, ReadMode::FirstByte) => "get_obj_pt_ttfb",
    }
}

fn record(
    report: &mut BenchmarkReport,
    target: Target,
    operation: &str,
    series: &SampleSeries,
) -> BenchResult<()> {
    report.insert(stat_name(target, operation), series.summarize()?);
    if let Some(counts) = series.counts {
        report.insert(count_name(target), counts);
    }
    Ok(())
}

/// Lists the bucket `iterations` times per store.
#[tracing::instrument(level = "info", skip(backends))]
pub async fn list(
    backends: &Backends,
    bucket: &str,
    iterations: usize,
    max_keys: usize,
) -> BenchResult<BenchmarkReport> {
    let mut report = BenchmarkReport::new();
    for target in Target::BOTH {
        let runner = Runner::new(backends.get(target), bucket);
        let series = runner.list(iterations, max_keys).await?;
        record(&mut report, target, "list_objects_v2", &series)?;
    }
    tracing::info!("list phase finished");
    Ok(report)
}

/// Uploads generated bodies for all keys to each store.
#[tracing::instrument(level = "info", skip_all, fields(bucket = %bucket, keys = keys.len()))]
pub async fn put(
    backends: &Backends,
    bucket: &str,
    keys: &WorkingSet,
    payloads: &PayloadGenerator,
) -> BenchResult<BenchmarkReport> {
    let mut report = BenchmarkReport::new();
    for target in Target::BOTH {
        let runner = Runner::new(backends.get(target), bucket);
        let series = runner.put(keys, payloads).await?;
        record(&mut report, target, "put_obj", &series)?;
    }
    tracing::info!("put phase finished");
    Ok(report)
}

/// Deletes all keys from each store.
#[tracing::instrument(level = "info", skip_all, fields(bucket = %bucket, keys = keys.len()))]
pub async fn delete(
    backends: &Backends,
    bucket: &str,
    keys: &WorkingSet,
) -> BenchResult<BenchmarkReport> {
    let mut report = BenchmarkReport::new();
    for target in Target::BOTH {
        let runner = Runner::new(backends.get(target), bucket);
        let series = runner.delete(keys).await?;
        record(&mut report, target, "del_obj", &series)?;
    }
    tracing::info!("delete phase finished");
    Ok(report)
}

/// Reads all keys from each store.
#[tracing::instrument(level = "info", skip_all, fields(bucket = %bucket, keys = keys.len(), mode = ?mode))]
pub async fn get(
    backends: &Backends,
    bucket: &str,
    keys: &WorkingSet,
    mode: ReadMode,
) -> BenchResult<BenchmarkReport> {
    let operation = read_operation(mode, false);
    let mut report = BenchmarkReport::new();
    for target in Target::BOTH {
        let runner = Runner::new(backends.get(target), bucket);
        let series = runner.get(keys, mode).await?;
        record(&mut report, target, operation, &series)?;
    }
    tracing::info!("get phase finished");
    Ok(report)
}

/// Reads all keys through the proxy only, without a baseline comparison.
#[tracing::instrument(level = "info", skip_all, fields(bucket = %bucket, keys = keys.len(), mode = ?mode))]
pub async fn get_passthrough(
    backends: &Backends,
    bucket: &str,
    keys: &WorkingSet,
    mode: ReadMode,
) -> BenchResult<BenchmarkReport> {
    let mut report = BenchmarkReport::new();
    let runner = Runner::new(backends.proxy(), bucket);
    let series = runner.get(keys, mode).await?;
    record(
        &mut report,
        Target::Proxy,
        read_operation(mode, true),
        &series,
    )?;
    tracing::info!("passthrough get phase finished");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use boltbench_service::InMemoryBackend;

    use super::*;
    use crate::report::ObjectCount;

    fn backends(latency_ms: u64) -> (InMemoryBackend, Backends) {
        let baseline = InMemoryBackend::new("s3").with_latency(Duration::from_millis(latency_ms));
        let proxy = baseline.renamed("bolt");
        let backends = Backends::new(Box::new(baseline.clone()), Box::new(proxy));
        (baseline, backends)
    }

    fn names(report: &BenchmarkReport) -> Vec<&str> {
        report.names().collect()
    }

    #[test]
    fn names_follow_the_convention() {
        assert_eq!(
            stat_name(Target::Baseline, "put_obj"),
            "s3_put_obj_perf_stats"
        );
        assert_eq!(count_name(Target::Proxy), "boltCount");
        assert_eq!(read_operation(ReadMode::FirstByte, true), "get_obj_pt_ttfb");
    }

    #[tokio::test(start_paused = true)]
    async fn list_phase_runs_baseline_first() {
        let (store, backends) = backends(5);
        store.insert("bucket", "key", "x");

        let report = list(&backends, "bucket", 2, 1000).await.unwrap();

        assert_eq!(
            names(&report),
            [
                "bolt_list_objects_v2_perf_stats",
                "s3_list_objects_v2_perf_stats"
            ]
        );
        let order: Vec<_> = store.requests().iter().map(|r| r.backend).collect();
        assert_eq!(order, ["s3", "s3", "bolt", "bolt"]);

        let stats = report.stats("s3_list_objects_v2_perf_stats").unwrap();
        assert_eq!(stats.latency.unwrap().p50, 5);
        assert_eq!(stats.throughput.unwrap().average, 0.2);
    }

    #[tokio::test(start_paused = true)]
    async fn get_phase_emits_counts_per_store() {
        let (store, backends) = backends(1);
        store.insert("bucket", "a", "aaaa");
        store.insert("bucket", "b.gz", "bb");

        let keys = WorkingSet::from(vec!["a".to_owned(), "b.gz".to_owned()]);
        let report = get(&backends, "bucket", &keys, ReadMode::FirstByte)
            .await
            .unwrap();

        assert_eq!(
            names(&report),
            [
                "boltCount",
                "bolt_get_obj_ttfb_perf_stats",
                "s3Count",
                "s3_get_obj_ttfb_perf_stats"
            ]
        );
        let expected = ObjectCount {
            compressed: 1,
            uncompressed: 1,
        };
        assert_eq!(report.count("s3Count"), Some(expected));
        assert_eq!(report.count("boltCount"), Some(expected));
        assert_eq!(expected.total(), keys.len() as u64);
        assert_eq!(
            report
                .stats("s3_get_obj_ttfb_perf_stats")
                .unwrap()
                .object_size
                .unwrap()
                .p90,
            4
        );
    }

    #[tokio::test]
    async fn passthrough_only_addresses_the_proxy() {
        let (store, backends) = backends(0);
        store.insert("bucket", "a", "aaaa");

        let keys = WorkingSet::from(vec!["a".to_owned()]);
        let report = get_passthrough(&backends, "bucket", &keys, ReadMode::Full)
            .await
            .unwrap();

        assert_eq!(names(&report), ["boltCount", "bolt_get_obj_pt_perf_stats"]);
        assert!(store.requests().iter().all(|r| r.backend == "bolt"));
    }

    #[tokio::test]
    async fn empty_working_set_yields_empty_blocks() {
        let (store, backends) = backends(0);
        store.create_bucket("bucket");

        let report = get(&backends, "bucket", &WorkingSet::default(), ReadMode::Full)
            .await
            .unwrap();

        assert!(report.stats("s3_get_obj_perf_stats").unwrap().is_empty());
        assert_eq!(report.count("boltCount"), Some(ObjectCount::default()));
        assert!(store.requests().is_empty());
    }
}
