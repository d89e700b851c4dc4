//! Timed execution of one operation kind against one store.

use boltbench_service::{Backend, BackendError, PayloadStream};
use futures_util::StreamExt;
use tokio::time::Instant;

use crate::error::{BenchError, BenchResult};
use crate::keys::WorkingSet;
use crate::payload::PayloadGenerator;
use crate::report::ObjectCount;
use crate::stats::{PerfStats, compute_perf_stats};

/// How much of a response body a read waits for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadMode {
    /// Stop at the first non-empty chunk.
    ///
    /// The stream yields whole chunks, so this may read up to one chunk of the body rather than a
    /// single byte. The latency still ends when the first data arrives.
    FirstByte,
    /// Read until the body is exhausted.
    Full,
}

/// Measurements of one (store, operation) pair, in request order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleSeries {
    /// Latency per request in whole milliseconds.
    pub latencies: Vec<u64>,
    /// Listed objects per millisecond, for listings.
    pub throughputs: Option<Vec<f64>>,
    /// Declared content length, for reads.
    pub sizes: Option<Vec<u64>>,
    /// Payload composition, for reads.
    pub counts: Option<ObjectCount>,
}

impl SampleSeries {
    fn listing() -> Self {
        Self {
            throughputs: Some(Vec::new()),
            ..Default::default()
        }
    }

    fn reads() -> Self {
        Self {
            sizes: Some(Vec::new()),
            counts: Some(ObjectCount::default()),
            ..Default::default()
        }
    }

    /// Summarizes the series. A series without samples yields empty statistics.
    pub fn summarize(&self) -> BenchResult<PerfStats> {
        if self.latencies.is_empty() {
            return Ok(PerfStats::default());
        }

        compute_perf_stats(
            &self.latencies,
            self.throughputs.as_deref(),
            self.sizes.as_deref(),
        )
    }
}

/// Issues requests against a single store and records a sample per request.
///
/// Requests are strictly sequential. The first failing request aborts the run and the samples
/// collected so far are discarded.
#[derive(Clone, Copy, Debug)]
pub struct Runner<'a> {
    backend: &'a dyn Backend,
    bucket: &'a str,
}

impl<'a> Runner<'a> {
    /// Creates a runner for `bucket` on `backend`.
    pub fn new(backend: &'a dyn Backend, bucket: &'a str) -> Self {
        Self { backend, bucket }
    }

    fn failed(&self, operation: &'static str, target: &str, cause: BackendError) -> BenchError {
        BenchError::Backend {
            backend: self.backend.name(),
            operation,
            target: target.to_owned(),
            cause,
        }
    }

    /// Lists the bucket `iterations` times, each time requesting up to `max_keys` objects.
    pub async fn list(&self, iterations: usize, max_keys: usize) -> BenchResult<SampleSeries> {
        let mut series = SampleSeries::listing();

        for _ in 0..iterations {
            let start = Instant::now();
            let listing = self
                .backend
                .list_objects(self.bucket, Some(max_keys))
                .await
                .map_err(|e| self.failed("list", self.bucket, e))?;
            let latency = elapsed_millis(start);

            tracing::trace!(latency, key_count = listing.key_count, "listed objects");
            series.latencies.push(latency);
            if let Some(ref mut throughputs) = series.throughputs {
                throughputs.push(listing.key_count as f64 / latency as f64);
            }
        }

        Ok(series)
    }

    /// Uploads the body generated for each key's index.
    pub async fn put(
        &self,
        keys: &WorkingSet,
        payloads: &PayloadGenerator,
    ) -> BenchResult<SampleSeries> {
        let mut series = SampleSeries::default();

        for (index, key) in keys.iter().enumerate() {
            let body = payloads.payload(index);

            let start = Instant::now();
            self.backend
                .put_object(self.bucket, key, body)
                .await
                .map_err(|e| self.failed("put", key, e))?;
            let latency = elapsed_millis(start);

            tracing::trace!(key, latency, "put object");
            series.latencies.push(latency);
        }

        Ok(series)
    }

    /// Deletes every key.
    pub async fn delete(&self, keys: &WorkingSet) -> BenchResult<SampleSeries> {
        let mut series = SampleSeries::default();

        for key in keys.iter() {
            let start = Instant::now();
            self.backend
                .delete_object(self.bucket, key)
                .await
                .map_err(|e| self.failed("delete", key, e))?;
            let latency = elapsed_millis(start);

            tracing::trace!(key, latency, "deleted object");
            series.latencies.push(latency);
        }

        Ok(series)
    }

    /// Reads every key, timing the request together with draining its body.
    pub async fn get(&self, keys: &WorkingSet, mode: ReadMode) -> BenchResult<SampleSeries> {
        let mut series = SampleSeries::reads();

        for key in keys.iter() {
            let start = Instant::now();
            let mut response = self
                .backend
                .get_object(self.bucket, key)
                .await
                .map_err(|e| self.failed("get", key, e))?;
            drain(&mut response.stream, mode).await;
            let latency = elapsed_millis(start);

            let compressed = response.is_compressed(key);
            tracing::trace!(key, latency, compressed, "read object");

            series.latencies.push(latency);
            if let Some(ref mut sizes) = series.sizes {
                sizes.push(response.content_length);
            }
            if let Some(ref mut counts) = series.counts {
                counts.record(compressed);
            }
            // Dropping the response closes the body stream.
            drop(response);
        }

        Ok(series)
    }
}

fn elapsed_millis(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Consumes the body according to `mode`.
///
/// Read errors never fail the request. They end the body in either mode.
async fn drain(stream: &mut PayloadStream, mode: ReadMode) {
    while let Some(Ok(chunk)) = stream.next().await {
        if mode == ReadMode::FirstByte && !chunk.is_empty() {
            break;
        }
    }
}
