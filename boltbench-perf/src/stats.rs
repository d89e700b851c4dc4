//! Summary statistics over sample series.
//!
//! Percentiles are plain rank lookups into the sorted series: p50 is the element at index `n / 2`
//! and p90 the element at index `⌊0.9 · n⌋`. There is no interpolation between neighbors.

use std::cmp::Ordering;

use serde::ser::{Serialize, Serializer};

use crate::error::{BenchError, BenchResult};

/// A measured value that can be summarized.
pub trait Sample: Copy {
    /// Arithmetic mean of a non-empty slice.
    fn mean(samples: &[Self]) -> f64;

    /// Total order used for sorting.
    fn compare(&self, other: &Self) -> Ordering;

    /// Renders the value for reports.
    fn render(self) -> String;
}

impl Sample for u64 {
    fn mean(samples: &[Self]) -> f64 {
        samples.iter().sum::<u64>() as f64 / samples.len() as f64
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn render(self) -> String {
        self.to_string()
    }
}

impl Sample for f64 {
    fn mean(samples: &[Self]) -> f64 {
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }

    fn render(self) -> String {
        format!("{self:.2}")
    }
}

/// Index of the median in a sorted series of length `n`.
pub fn p50_index(n: usize) -> usize {
    n / 2
}

/// Index of the 90th percentile in a sorted series of length `n`.
///
/// `⌊0.9 · n⌋` is below `n` for every `n ≥ 1`; the clamp only makes this explicit.
pub fn p90_index(n: usize) -> usize {
    ((n as f64 * 0.9) as usize).min(n.saturating_sub(1))
}

/// Average, median and 90th percentile of one series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary<T> {
    /// Arithmetic mean of the series.
    pub average: f64,
    /// Element at [`p50_index`] of the sorted series.
    pub p50: T,
    /// Element at [`p90_index`] of the sorted series.
    pub p90: T,
}

/// Summarizes a series. Returns `None` if the series is empty.
///
/// The mean is taken over the series as given. Percentiles are looked up in a stably sorted copy.
pub fn summarize<T: Sample>(samples: &[T]) -> Option<Summary<T>> {
    if samples.is_empty() {
        return None;
    }

    let average = T::mean(samples);

    let mut sorted = samples.to_vec();
    sorted.sort_by(T::compare);

    let n = sorted.len();
    Some(Summary {
        average,
        p50: sorted[p50_index(n)],
        p90: sorted[p90_index(n)],
    })
}

/// The unit a [`Summary`] is rendered with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Unit {
    /// Latency in milliseconds.
    Millis,
    /// Listed objects per millisecond.
    ObjectsPerMilli,
    /// Object size in bytes.
    Bytes,
}

impl Unit {
    /// The suffix appended to rendered values.
    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Millis => "ms",
            Unit::ObjectsPerMilli => "objects/ms",
            Unit::Bytes => "bytes",
        }
    }
}

/// A [`Summary`] rendered as strings with units.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct FormattedSummary {
    /// The mean, with two decimals.
    pub average: String,
    /// The median.
    pub p50: String,
    /// The 90th percentile.
    pub p90: String,
}

impl<T: Sample> Summary<T> {
    /// Renders the summary with the given unit.
    pub fn format(&self, unit: Unit) -> FormattedSummary {
        let suffix = unit.suffix();
        FormattedSummary {
            average: format!("{:.2} {suffix}", self.average),
            p50: format!("{} {suffix}", self.p50.render()),
            p90: format!("{} {suffix}", self.p90.render()),
        }
    }
}

/// Statistics of one (store, operation) pair.
///
/// Empty when the run had no keys to operate on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerfStats {
    /// Latency per request.
    pub latency: Option<Summary<u64>>,
    /// Listing throughput, for list operations.
    pub throughput: Option<Summary<f64>>,
    /// Requests per millisecond of accumulated latency, for all other operations.
    pub overall_throughput: Option<f64>,
    /// Declared size of read objects.
    pub object_size: Option<Summary<u64>>,
}

impl PerfStats {
    /// Returns `true` if no statistic was computed.
    pub fn is_empty(&self) -> bool {
        self.latency.is_none()
            && self.throughput.is_none()
            && self.overall_throughput.is_none()
            && self.object_size.is_none()
    }
}

/// Computes the statistics of one series.
///
/// Each provided series is summarized on its own. Without a throughput series, a single
/// throughput figure is derived as `count / sum of latencies`, which is a ratio of sums rather than
/// a mean of per-request rates. Empty optional series are skipped.
///
/// Fails with [`BenchError::EmptySamples`] if there are no latency samples.
pub fn compute_perf_stats(
    latencies: &[u64],
    throughputs: Option<&[f64]>,
    sizes: Option<&[u64]>,
) -> BenchResult<PerfStats> {
    let latency = summarize(latencies).ok_or(BenchError::EmptySamples)?;

    let (throughput, overall_throughput) = match throughputs {
        Some(throughputs) => (summarize(throughputs), None),
        None => {
            let total: u64 = latencies.iter().sum();
            (None, Some(latencies.len() as f64 / total as f64))
        }
    };

    Ok(PerfStats {
        latency: Some(latency),
        throughput,
        overall_throughput,
        object_size: sizes.and_then(summarize),
    })
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct FormattedStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    latency: Option<FormattedSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    throughput: Option<FormattedSummary>,
    #[serde(rename = "throughputT", skip_serializing_if = "Option::is_none")]
    overall_throughput: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    object_size: Option<FormattedSummary>,
}

impl Serialize for PerfStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let formatted = FormattedStats {
            latency: self.latency.map(|s| s.format(Unit::Millis)),
            throughput: self.throughput.map(|s| s.format(Unit::ObjectsPerMilli)),
            overall_throughput: self
                .overall_throughput
                .map(|t| format!("{t:.2} {}", Unit::ObjectsPerMilli.suffix())),
            object_size: self.object_size.map(|s| s.format(Unit::Bytes)),
        };
        formatted.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn percentiles_use_rank_indices() {
        let summary = summarize(&[30u64, 10, 50, 20, 40]).unwrap();

        assert_eq!(summary.average, 30.0);
        assert_eq!(summary.p50, 30);
        assert_eq!(summary.p90, 50);
    }

    #[test]
    fn single_sample_is_every_percentile() {
        let summary = summarize(&[7u64]).unwrap();

        assert_eq!(summary.average, 7.0);
        assert_eq!(summary.p50, 7);
        assert_eq!(summary.p90, 7);
    }

    #[test]
    fn p90_index_never_leaves_the_series() {
        for n in 1..=2000 {
            assert_eq!(p90_index(n), (n * 9) / 10, "n = {n}");
            assert!(p90_index(n) < n);
        }
        assert_eq!(p50_index(10), 5);
        assert_eq!(p90_index(10), 9);
        assert_eq!(p90_index(9), 8);
    }

    #[test]
    fn average_uses_the_unsorted_series() {
        let summary = summarize(&[1u64, 100, 2, 3]).unwrap();

        assert_eq!(summary.average, 26.5);
        assert_eq!(summary.p50, 3);
        assert_eq!(summary.p90, 100);
    }

    #[test]
    fn float_series_sort_numerically() {
        let summary = summarize(&[2.5f64, f64::INFINITY, 0.5, 1.5]).unwrap();

        assert_eq!(summary.p50, 2.5);
        assert_eq!(summary.p90, f64::INFINITY);
    }

    #[test]
    fn empty_latencies_fail() {
        let result = compute_perf_stats(&[], None, None);
        assert!(matches!(result, Err(BenchError::EmptySamples)));
    }

    #[test]
    fn fallback_throughput_is_a_ratio_of_sums() {
        let stats = compute_perf_stats(&[10, 30], None, None).unwrap();

        assert_eq!(stats.throughput, None);
        assert_eq!(stats.overall_throughput, Some(2.0 / 40.0));
        assert_eq!(stats.object_size, None);
    }

    #[test]
    fn provided_series_are_summarized_independently() {
        let stats =
            compute_perf_stats(&[5, 1, 3], Some(&[0.5, 2.0, 1.0]), Some(&[100, 300, 200])).unwrap();

        assert_eq!(stats.latency.unwrap().p50, 3);
        assert_eq!(stats.throughput.unwrap().p50, 1.0);
        assert_eq!(stats.overall_throughput, None);
        assert_eq!(stats.object_size.unwrap().p90, 300);
    }

    #[test]
    fn empty_optional_series_are_skipped() {
        let stats = compute_perf_stats(&[5], Some(&[]), Some(&[])).unwrap();

        assert!(stats.latency.is_some());
        assert_eq!(stats.throughput, None);
        assert_eq!(stats.object_size, None);
    }

    #[test]
    fn serializes_with_units() {
        let stats = compute_perf_stats(
            &[30, 10, 50, 20, 40],
            None,
            Some(&[100, 100, 100, 100, 100]),
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            json!({
                "latency": { "average": "30.00 ms", "p50": "30 ms", "p90": "50 ms" },
                "throughputT": "0.03 objects/ms",
                "objectSize": { "average": "100.00 bytes", "p50": "100 bytes", "p90": "100 bytes" },
            })
        );

        let list = compute_perf_stats(&[4], Some(&[2.5]), None).unwrap();
        assert_eq!(
            serde_json::to_value(&list).unwrap()["throughput"],
            json!({ "average": "2.50 objects/ms", "p50": "2.50 objects/ms", "p90": "2.50 objects/ms" })
        );
    }

    #[test]
    fn empty_stats_serialize_to_an_empty_object() {
        assert_eq!(
            serde_json::to_value(PerfStats::default()).unwrap(),
            json!({})
        );
    }
}
