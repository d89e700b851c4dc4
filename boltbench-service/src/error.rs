use thiserror::Error;

use crate::backend::BackendError;

/// Errors raised by the tools built on top of the backends.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// An error from one of the storage backends.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// An I/O error while consuming or decompressing a response body.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
