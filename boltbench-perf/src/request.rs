//! Benchmark requests and their validation.

use std::fmt;
use std::num::ParseIntError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound for the number of keys a run operates on, matching the S3 listing page size.
pub const MAX_KEY_COUNT: usize = 1000;

/// Number of keys used when the request does not specify one.
pub const DEFAULT_KEY_COUNT: usize = 1000;

/// Length of generated object bodies when the request does not specify one.
pub const DEFAULT_PAYLOAD_LENGTH: usize = 100;

/// Number of repeated listings per store when the request does not specify one.
pub const DEFAULT_LIST_ITERATIONS: usize = 10;

/// A raw benchmark invocation, as received from the caller.
///
/// Numeric parameters are transported as strings. Use [`BenchmarkRequest::try_from`] to validate.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PerfEvent {
    /// The operation kind, case-insensitive. Empty runs `ALL`.
    pub request_type: String,
    /// The bucket to benchmark.
    pub bucket: String,
    /// Maximum number of keys, clamped to [`MAX_KEY_COUNT`].
    pub num_keys: String,
    /// Length of generated object bodies in bytes.
    pub obj_length: String,
    /// Number of repeated listings per store.
    pub num_iter: String,
}

/// The workload a benchmark run executes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OperationKind {
    /// Repeatedly list the bucket.
    List,
    /// Upload generated keys.
    Put,
    /// Delete generated keys.
    Delete,
    /// Read discovered keys completely.
    Get,
    /// Read the first byte of discovered keys.
    GetTtfb,
    /// Read discovered keys completely through the proxy only.
    GetPassthrough,
    /// Read the first byte of discovered keys through the proxy only.
    GetPassthroughTtfb,
    /// Put, delete, list and get in sequence.
    All,
}

impl OperationKind {
    /// Parses a request type, ignoring case.
    ///
    /// An empty request type selects [`OperationKind::All`]. Unknown types return `None`.
    pub fn parse(request_type: &str) -> Option<Self> {
        let kind = match request_type.to_ascii_uppercase().as_str() {
            "" | "ALL" => Self::All,
            "LIST_OBJECTS_V2" => Self::List,
            "PUT_OBJECT" => Self::Put,
            "DELETE_OBJECT" => Self::Delete,
            "GET_OBJECT" => Self::Get,
            "GET_OBJECT_TTFB" => Self::GetTtfb,
            "GET_OBJECT_PASSTHROUGH" => Self::GetPassthrough,
            "GET_OBJECT_PASSTHROUGH_TTFB" => Self::GetPassthroughTtfb,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns the canonical request type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "LIST_OBJECTS_V2",
            Self::Put => "PUT_OBJECT",
            Self::Delete => "DELETE_OBJECT",
            Self::Get => "GET_OBJECT",
            Self::GetTtfb => "GET_OBJECT_TTFB",
            Self::GetPassthrough => "GET_OBJECT_PASSTHROUGH",
            Self::GetPassthroughTtfb => "GET_OBJECT_PASSTHROUGH_TTFB",
            Self::All => "ALL",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a [`PerfEvent`] is rejected.
#[derive(Debug, Error)]
pub enum RequestError {
    /// No bucket was given.
    #[error("missing bucket name")]
    MissingBucket,

    /// A numeric parameter could not be parsed.
    #[error("`{field}` must be a non-negative integer, got {value:?}")]
    InvalidNumber {
        /// The event field name.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// The parse error.
        #[source]
        cause: ParseIntError,
    },
}

/// A validated, immutable benchmark request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BenchmarkRequest {
    /// The workload to run. `None` for unrecognized request types, which produce empty reports.
    pub operation: Option<OperationKind>,
    /// The bucket to benchmark.
    pub bucket: String,
    /// Maximum number of keys to generate or discover.
    pub key_count_limit: usize,
    /// Length of generated object bodies in bytes.
    pub payload_length: usize,
    /// Number of repeated listings per store.
    pub list_iterations: usize,
}

impl BenchmarkRequest {
    /// Creates a request with default limits.
    pub fn new(operation: OperationKind, bucket: impl Into<String>) -> Self {
        Self {
            operation: Some(operation),
            bucket: bucket.into(),
            key_count_limit: DEFAULT_KEY_COUNT,
            payload_length: DEFAULT_PAYLOAD_LENGTH,
            list_iterations: DEFAULT_LIST_ITERATIONS,
        }
    }

    /// Sets the key count limit, clamped to [`MAX_KEY_COUNT`].
    pub fn key_count_limit(mut self, limit: usize) -> Self {
        self.key_count_limit = limit.min(MAX_KEY_COUNT);
        self
    }

    /// Sets the length of generated object bodies.
    pub fn payload_length(mut self, length: usize) -> Self {
        self.payload_length = length;
        self
    }

    /// Sets the number of repeated listings per store.
    pub fn list_iterations(mut self, iterations: usize) -> Self {
        self.list_iterations = iterations;
        self
    }
}

impl TryFrom<&PerfEvent> for BenchmarkRequest {
    type Error = RequestError;

    fn try_from(event: &PerfEvent) -> Result<Self, Self::Error> {
        let key_count_limit = parse_number("numKeys", &event.num_keys, DEFAULT_KEY_COUNT)?;
        let payload_length = parse_number("objLength", &event.obj_length, DEFAULT_PAYLOAD_LENGTH)?;
        let list_iterations = parse_number("numIter", &event.num_iter, DEFAULT_LIST_ITERATIONS)?;

        if event.bucket.is_empty() {
            return Err(RequestError::MissingBucket);
        }

        Ok(Self {
            operation: OperationKind::parse(&event.request_type),
            bucket: event.bucket.clone(),
            key_count_limit: key_count_limit.min(MAX_KEY_COUNT),
            payload_length,
            list_iterations,
        })
    }
}

fn parse_number(field: &'static str, value: &str, default: usize) -> Result<usize, RequestError> {
    if value.is_empty() {
        return Ok(default);
    }

    value.parse().map_err(|cause| RequestError::InvalidNumber {
        field,
        value: value.to_owned(),
        cause,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(request_type: &str, num_keys: &str, obj_length: &str) -> PerfEvent {
        PerfEvent {
            request_type: request_type.into(),
            bucket: "bucket".into(),
            num_keys: num_keys.into(),
            obj_length: obj_length.into(),
            num_iter: String::new(),
        }
    }

    #[test]
    fn defaults_apply_to_empty_fields() {
        let request = BenchmarkRequest::try_from(&event("", "", "")).unwrap();

        assert_eq!(request.operation, Some(OperationKind::All));
        assert_eq!(request.key_count_limit, 1000);
        assert_eq!(request.payload_length, 100);
        assert_eq!(request.list_iterations, 10);
    }

    #[test]
    fn request_type_is_case_insensitive() {
        let request = BenchmarkRequest::try_from(&event("get_object_ttfb", "", "")).unwrap();
        assert_eq!(request.operation, Some(OperationKind::GetTtfb));
    }

    #[test]
    fn key_count_is_clamped() {
        let request = BenchmarkRequest::try_from(&event("put_object", "5000", "")).unwrap();
        assert_eq!(request.key_count_limit, MAX_KEY_COUNT);

        let request = BenchmarkRequest::new(OperationKind::Put, "bucket").key_count_limit(1001);
        assert_eq!(request.key_count_limit, MAX_KEY_COUNT);
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        let error = BenchmarkRequest::try_from(&event("put_object", "ten", "")).unwrap_err();
        assert!(matches!(
            error,
            RequestError::InvalidNumber {
                field: "numKeys",
                ..
            }
        ));

        let error = BenchmarkRequest::try_from(&event("put_object", "", "-1")).unwrap_err();
        assert!(matches!(
            error,
            RequestError::InvalidNumber {
                field: "objLength",
                ..
            }
        ));
    }

    #[test]
    fn missing_bucket_is_rejected() {
        let event = PerfEvent::default();
        assert!(matches!(
            BenchmarkRequest::try_from(&event),
            Err(RequestError::MissingBucket)
        ));
    }

    #[test]
    fn unknown_request_type_is_not_an_error() {
        let request = BenchmarkRequest::try_from(&event("copy_object", "", "")).unwrap();
        assert_eq!(request.operation, None);
    }

    #[test]
    fn event_deserializes_from_camel_case() {
        let event: PerfEvent = serde_json::from_str(
            r#"{"requestType": "list_objects_v2", "bucket": "b", "numKeys": "5"}"#,
        )
        .unwrap();

        assert_eq!(event.request_type, "list_objects_v2");
        assert_eq!(event.num_keys, "5");
        assert_eq!(event.obj_length, "");
    }
}
