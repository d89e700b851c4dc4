//! The named statistic blocks produced by a benchmark run.

use std::collections::BTreeMap;
use std::fmt::{self, Write};

use serde::{Serialize, Serializer};
use yansi::Paint;

use crate::stats::{FormattedSummary, PerfStats, Unit};

/// Number of read objects by payload composition.
///
/// Both numbers serialize as decimal strings, like every other report value.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ObjectCount {
    /// Objects served gzip-encoded or stored under a compressed file name.
    #[serde(serialize_with = "serialize_decimal")]
    pub compressed: u64,
    /// All other objects.
    #[serde(serialize_with = "serialize_decimal")]
    pub uncompressed: u64,
}

fn serialize_decimal<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

impl ObjectCount {
    /// Counts one object.
    pub fn record(&mut self, compressed: bool) {
        if compressed {
            self.compressed += 1;
        } else {
            self.uncompressed += 1;
        }
    }

    /// The number of counted objects.
    pub fn total(&self) -> u64 {
        self.compressed + self.uncompressed
    }
}

/// A single named block of a [`BenchmarkReport`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportEntry {
    /// Statistics of one (store, operation) pair.
    Stats(PerfStats),
    /// Payload composition of the objects read from one store.
    Count(ObjectCount),
}

impl From<PerfStats> for ReportEntry {
    fn from(stats: PerfStats) -> Self {
        Self::Stats(stats)
    }
}

impl From<ObjectCount> for ReportEntry {
    fn from(count: ObjectCount) -> Self {
        Self::Count(count)
    }
}

/// The result of a benchmark run: statistic blocks by name.
///
/// Names follow `{store}_{operation}_perf_stats` for statistics and `{store}Count` for object
/// counts. Serializes as a flat JSON object in name order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BenchmarkReport {
    entries: BTreeMap<String, ReportEntry>,
}

impl BenchmarkReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a block, replacing any previous block of the same name.
    pub fn insert(&mut self, name: impl Into<String>, entry: impl Into<ReportEntry>) {
        self.entries.insert(name.into(), entry.into());
    }

    /// Returns the block with the given name.
    pub fn get(&self, name: &str) -> Option<&ReportEntry> {
        self.entries.get(name)
    }

    /// Returns the statistics block with the given name.
    pub fn stats(&self, name: &str) -> Option<&PerfStats> {
        match self.get(name)? {
            ReportEntry::Stats(stats) => Some(stats),
            ReportEntry::Count(_) => None,
        }
    }

    /// Returns the count block with the given name.
    pub fn count(&self, name: &str) -> Option<ObjectCount> {
        match self.get(name)? {
            ReportEntry::Count(count) => Some(*count),
            ReportEntry::Stats(_) => None,
        }
    }

    /// Moves all blocks of `other` into this report.
    ///
    /// On a name collision the block of `other` wins.
    pub fn merge(&mut self, other: BenchmarkReport) {
        for (name, entry) in other.entries {
            if self.entries.insert(name.clone(), entry).is_some() {
                tracing::warn!(name, "report block overwritten during merge");
            }
        }
    }

    /// Iterates over the block names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the report has no blocks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn write_summary(f: &mut impl Write, label: &str, summary: &FormattedSummary) -> fmt::Result {
    writeln!(
        f,
        "  {:<12} avg {}  p50 {}  p90 {}",
        label,
        summary.average.bold(),
        summary.p50,
        summary.p90
    )
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "{}", "no statistics".dim());
        }

        for (name, entry) in &self.entries {
            writeln!(f, "{}", name.bold().blue())?;
            match entry {
                ReportEntry::Stats(stats) if stats.is_empty() => {
                    writeln!(f, "  {}", "no samples".dim())?;
                }
                ReportEntry::Stats(stats) => {
                    if let Some(latency) = stats.latency {
                        write_summary(f, "latency", &latency.format(Unit::Millis))?;
                    }
                    if let Some(throughput) = stats.throughput {
                        write_summary(f, "throughput", &throughput.format(Unit::ObjectsPerMilli))?;
                    }
                    if let Some(throughput) = stats.overall_throughput {
                        let rendered =
                            format!("{throughput:.2} {}", Unit::ObjectsPerMilli.suffix());
                        writeln!(f, "  {:<12} {}", "throughput", rendered.bold())?;
                    }
                    if let Some(size) = stats.object_size {
                        write_summary(f, "object size", &size.format(Unit::Bytes))?;
                    }
                }
                ReportEntry::Count(count) => {
                    writeln!(
                        f,
                        "  compressed {}  uncompressed {}",
                        count.compressed.bold().green(),
                        count.uncompressed.bold()
                    )?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::stats::compute_perf_stats;

    #[test]
    fn counts_sum_to_total() {
        let mut count = ObjectCount::default();
        for compressed in [true, false, false, true, false] {
            count.record(compressed);
        }

        assert_eq!(count.compressed, 2);
        assert_eq!(count.uncompressed, 3);
        assert_eq!(count.total(), 5);
    }

    #[test]
    fn merge_is_a_union_with_last_write_wins() {
        let mut first = BenchmarkReport::new();
        first.insert("a", ObjectCount::default());
        first.insert("shared", ObjectCount::default());

        let mut second = BenchmarkReport::new();
        second.insert(
            "shared",
            ObjectCount {
                compressed: 1,
                uncompressed: 0,
            },
        );
        second.insert("b", PerfStats::default());

        first.merge(second);

        assert_eq!(first.names().collect::<Vec<_>>(), ["a", "b", "shared"]);
        assert_eq!(first.count("shared").unwrap().compressed, 1);
        assert!(first.stats("b").unwrap().is_empty());
    }

    #[test]
    fn serializes_as_flat_object() {
        let mut report = BenchmarkReport::new();
        report.insert(
            "s3Count",
            ObjectCount {
                compressed: 0,
                uncompressed: 2,
            },
        );
        report.insert(
            "s3_get_obj_perf_stats",
            compute_perf_stats(&[4, 4], None, Some(&[10, 10])).unwrap(),
        );

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "s3Count": { "compressed": "0", "uncompressed": "2" },
                "s3_get_obj_perf_stats": {
                    "latency": { "average": "4.00 ms", "p50": "4 ms", "p90": "4 ms" },
                    "throughputT": "0.25 objects/ms",
                    "objectSize": { "average": "10.00 bytes", "p50": "10 bytes", "p90": "10 bytes" },
                },
            })
        );
        assert_eq!(
            serde_json::to_value(BenchmarkReport::new()).unwrap(),
            json!({})
        );
    }

    #[test]
    fn text_rendering_lists_every_block() {
        let mut report = BenchmarkReport::new();
        report.insert("boltCount", ObjectCount::default());
        report.insert(
            "bolt_list_objects_v2_perf_stats",
            compute_perf_stats(&[2], Some(&[1.5]), None).unwrap(),
        );

        let text = report.to_string();
        assert!(text.contains("boltCount"));
        assert!(text.contains("bolt_list_objects_v2_perf_stats"));
        assert!(text.contains("1.50 objects/ms"));
    }
}
