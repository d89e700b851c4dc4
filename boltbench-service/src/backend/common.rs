use std::fmt;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::PayloadStream;

/// User agent suffix attached to outgoing requests.
pub const APP_NAME: &str = "boltbench";

/// File name suffixes of objects that are stored compressed.
pub const COMPRESSED_SUFFIXES: &[&str] = &[".gz"];

/// The content encoding that marks a compressed response.
pub const GZIP_ENCODING: &str = "gzip";

/// A type-erased [`Backend`] instance.
pub type BoxedBackend = Box<dyn Backend>;

/// The capabilities of an object store that can be benchmarked.
///
/// Implemented once per kind of client. The baseline store and the proxy are both driven through
/// this trait, which keeps every caller independent of the concrete client.
#[async_trait::async_trait]
pub trait Backend: fmt::Debug + Send + Sync + 'static {
    /// The backend name, used for diagnostics.
    fn name(&self) -> &'static str;

    /// Lists objects in the bucket, returning at most `max_keys` entries.
    ///
    /// Without `max_keys`, the backend's default page size applies.
    async fn list_objects(
        &self,
        bucket: &str,
        max_keys: Option<usize>,
    ) -> BackendResult<ListResponse>;

    /// Stores an object with the given body.
    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> BackendResult<()>;

    /// Deletes an object. Deleting a missing object succeeds.
    async fn delete_object(&self, bucket: &str, key: &str) -> BackendResult<()>;

    /// Retrieves an object, accepting gzip-encoded responses.
    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<GetResponse>;

    /// Retrieves the metadata of an object.
    async fn head_object(&self, bucket: &str, key: &str) -> BackendResult<ObjectHead>;

    /// Lists all buckets visible to the caller.
    async fn list_buckets(&self) -> BackendResult<Vec<BucketInfo>>;

    /// Checks that a bucket exists and is accessible.
    async fn head_bucket(&self, bucket: &str) -> BackendResult<()>;
}

/// A single entry of a listing.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectInfo {
    /// The object key.
    pub key: String,
    /// Last modification time, formatted as RFC 3339.
    pub last_modified: Option<String>,
    /// The entity tag of the object.
    #[serde(rename = "ETag")]
    pub etag: Option<String>,
    /// Object size in bytes.
    pub size: u64,
    /// The storage class reported by the backend.
    pub storage_class: Option<String>,
}

/// The result of a listing call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListResponse {
    /// Returned objects in backend order.
    pub objects: Vec<ObjectInfo>,
    /// Number of keys the backend reports for this page.
    pub key_count: usize,
}

impl ListResponse {
    /// Returns the keys of all listed objects, preserving order.
    pub fn into_keys(self) -> Vec<String> {
        self.objects.into_iter().map(|object| object.key).collect()
    }
}

/// An object body being streamed from a backend, along with its content metadata.
pub struct GetResponse {
    /// The `Content-Encoding` of the response, if any.
    pub content_encoding: Option<String>,
    /// The declared `Content-Length` of the response.
    pub content_length: u64,
    /// The response body.
    pub stream: PayloadStream,
}

impl GetResponse {
    /// Returns `true` if the response body is gzip-encoded.
    pub fn is_gzip(&self) -> bool {
        self.content_encoding
            .as_deref()
            .is_some_and(|encoding| encoding.eq_ignore_ascii_case(GZIP_ENCODING))
    }

    /// Returns `true` if the object fetched from `key` holds compressed data.
    ///
    /// This is the case if either the response is gzip-encoded, or the key carries one of the
    /// [`COMPRESSED_SUFFIXES`].
    pub fn is_compressed(&self, key: &str) -> bool {
        self.is_gzip() || has_compressed_suffix(key)
    }
}

impl fmt::Debug for GetResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetResponse")
            .field("content_encoding", &self.content_encoding)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Returns `true` if the key names a compressed file.
pub fn has_compressed_suffix(key: &str) -> bool {
    COMPRESSED_SUFFIXES
        .iter()
        .any(|suffix| key.ends_with(suffix))
}

/// Object metadata returned by [`Backend::head_object`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectHead {
    /// The entity tag of the object.
    #[serde(rename = "ETag")]
    pub etag: Option<String>,
    /// The storage class reported by the backend.
    pub storage_class: Option<String>,
    /// Last modification time, formatted as RFC 3339.
    pub last_modified: Option<String>,
    /// Object size in bytes.
    pub content_length: u64,
}

/// A bucket returned by [`Backend::list_buckets`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketInfo {
    /// The bucket name.
    pub name: String,
    /// Creation time, formatted as RFC 3339.
    pub creation_date: Option<String>,
}

/// Errors returned by backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// IO errors related to payload streaming.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors returned by the S3 client, either from the transport or from the service itself.
    #[error("s3 error: {context}")]
    S3 {
        /// What the client was doing when the error occurred.
        context: String,
        /// The underlying client error.
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The requested bucket does not exist.
    #[error("bucket `{0}` does not exist")]
    NoSuchBucket(String),

    /// The requested object does not exist.
    #[error("object `{key}` does not exist in bucket `{bucket}`")]
    NotFound {
        /// The bucket that was searched.
        bucket: String,
        /// The missing key.
        key: String,
    },

    /// A failure injected into a test backend.
    #[error("injected failure: {0}")]
    Injected(String),
}

impl BackendError {
    pub(crate) fn s3<E>(context: impl Into<String>, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::S3 {
            context: context.into(),
            cause: Box::new(cause),
        }
    }
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::make_stream;

    fn response(content_encoding: Option<&str>) -> GetResponse {
        GetResponse {
            content_encoding: content_encoding.map(str::to_owned),
            content_length: 0,
            stream: make_stream(Bytes::new(), 1),
        }
    }

    #[test]
    fn gzip_encoding_marks_compressed() {
        assert!(response(Some("gzip")).is_compressed("plain.txt"));
        assert!(response(Some("GZIP")).is_compressed("plain.txt"));
        assert!(!response(Some("identity")).is_compressed("plain.txt"));
        assert!(!response(None).is_compressed("plain.txt"));
    }

    #[test]
    fn compressed_suffix_marks_compressed() {
        assert!(response(None).is_compressed("logs/2021-01-01.gz"));
        assert!(!response(None).is_compressed("logs/2021-01-01.gzip.txt"));
    }

    #[test]
    fn listing_keys_keep_order() {
        let listing = ListResponse {
            objects: ["b", "a", "c"]
                .into_iter()
                .map(|key| ObjectInfo {
                    key: key.into(),
                    ..Default::default()
                })
                .collect(),
            key_count: 3,
        };

        assert_eq!(listing.into_keys(), ["b", "a", "c"]);
    }
}
