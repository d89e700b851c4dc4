//! The service layer provides uniform access to the object stores under test.
//!
//! Both the baseline store and the caching proxy in front of it are driven through the same
//! [`Backend`] capability interface, so that benchmarks, validation and single-operation tools can
//! run against either one without knowing which concrete client sits behind it.
//!
//! Besides the backends, this crate contains the standalone tools that operate on them:
//!
//!  - [`validate`]: compares the content of an object as served by both stores.
//!  - [`autoheal`]: waits for the proxy to serve an object again after it was damaged.
//!  - [`ops`]: issues a single object or bucket operation against one store.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod autoheal;
pub mod backend;
pub mod error;
pub mod ops;
pub mod stream;
pub mod validate;

pub use backend::{
    Backend, BackendError, BackendResult, BoxedBackend, BucketInfo, GetResponse, InMemoryBackend,
    ListResponse, ObjectHead, ObjectInfo, RecordedRequest, S3Backend, S3BackendConfig,
};
pub use error::{ServiceError, ServiceResult};
pub use stream::PayloadStream;
