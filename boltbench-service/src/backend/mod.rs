//! Storage backends that can be benchmarked.

mod common;
mod in_memory;
mod s3;

pub use common::*;
pub use in_memory::{InMemoryBackend, RecordedRequest};
pub use s3::{S3Backend, S3BackendConfig};
