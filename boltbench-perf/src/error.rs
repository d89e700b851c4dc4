//! Errors that abort a benchmark run.

use boltbench_service::BackendError;
use thiserror::Error;

use crate::request::RequestError;

/// Errors that abort a benchmark run.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The request was rejected before any backend was contacted.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    /// A backend request failed. Samples collected so far are discarded.
    #[error("{operation} on `{target}` failed against {backend}: {cause}")]
    Backend {
        /// Name of the failing backend.
        backend: &'static str,
        /// The operation that failed.
        operation: &'static str,
        /// The key or bucket the operation was issued for.
        target: String,
        /// The backend error.
        #[source]
        cause: BackendError,
    },

    /// Statistics were requested for a series without latency samples.
    #[error("cannot summarize an empty sample series")]
    EmptySamples,
}

/// Result type for benchmark operations.
pub type BenchResult<T> = Result<T, BenchError>;
