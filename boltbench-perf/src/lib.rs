//! A comparative benchmarking engine for object stores.
//!
//! The engine runs identical workloads against a *baseline* store and a caching *proxy* in front
//! of it, and reports latency, throughput and payload composition for both. One invocation runs
//! one [`BenchmarkRequest`]:
//!
//!  - `LIST_OBJECTS_V2` lists the bucket repeatedly on both stores.
//!  - `PUT_OBJECT` and `DELETE_OBJECT` write or remove a generated, deterministic set of keys.
//!  - `GET_OBJECT` reads keys discovered from the baseline store, either completely or only up to
//!    the first byte (`_TTFB`). The `_PASSTHROUGH` variants read through the proxy only.
//!  - `ALL` runs put, delete, list and get in this order and merges their reports.
//!
//! Every request is awaited before the next one is issued, so samples of different keys and
//! stores never overlap. Any failing request aborts the whole run without a partial report.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod backends;
pub mod error;
pub mod keys;
pub mod payload;
pub mod perf;
pub mod phases;
pub mod report;
pub mod request;
pub mod runner;
pub mod stats;

pub use crate::backends::{Backends, Target};
pub use crate::error::{BenchError, BenchResult};
pub use crate::perf::run;
pub use crate::report::BenchmarkReport;
pub use crate::request::{BenchmarkRequest, OperationKind, PerfEvent};
