//! Single object and bucket operations against one store.
//!
//! This is the manual counterpart to the benchmarks: it issues exactly one request and returns the
//! backend's answer in a JSON-friendly shape.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::backend::{Backend, BucketInfo, ObjectHead, ObjectInfo};
use crate::error::ServiceResult;
use crate::validate::content_md5;

/// Parameters of a single operation.
///
/// All fields are optional on the wire; missing fields are empty.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OpsEvent {
    /// Which store to address: `S3` (or empty) for the baseline, anything else for the proxy.
    pub sdk_type: String,
    /// The operation to perform, case-insensitive.
    pub request_type: String,
    /// Target bucket.
    pub bucket: String,
    /// Target key, for object operations.
    pub key: String,
    /// Object body, for `PUT_OBJECT`.
    pub value: String,
}

/// The store an [`OpsEvent`] is addressed to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SdkType {
    /// The baseline store.
    S3,
    /// The proxy in front of the baseline store.
    Bolt,
}

impl SdkType {
    /// Selects the store from the event's `sdkType`.
    pub fn parse(sdk_type: &str) -> Self {
        if sdk_type.is_empty() || sdk_type.eq_ignore_ascii_case("s3") {
            SdkType::S3
        } else {
            SdkType::Bolt
        }
    }
}

/// A single supported operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    /// Read an object and hash its contents.
    GetObject,
    /// List the first page of objects in a bucket.
    ListObjectsV2,
    /// Read object metadata.
    HeadObject,
    /// List all buckets.
    ListBuckets,
    /// Check that a bucket exists.
    HeadBucket,
    /// Upload an object.
    PutObject,
    /// Delete an object.
    DeleteObject,
}

impl Operation {
    /// Parses a request type, ignoring case. Returns `None` for unknown types.
    pub fn parse(request_type: &str) -> Option<Self> {
        let operation = match request_type.to_ascii_uppercase().as_str() {
            "GET_OBJECT" => Self::GetObject,
            "LIST_OBJECTS_V2" => Self::ListObjectsV2,
            "HEAD_OBJECT" => Self::HeadObject,
            "LIST_BUCKETS" => Self::ListBuckets,
            "HEAD_BUCKET" => Self::HeadBucket,
            "PUT_OBJECT" => Self::PutObject,
            "DELETE_OBJECT" => Self::DeleteObject,
            _ => return None,
        };
        Some(operation)
    }
}

/// The result of a single operation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OpsResponse {
    /// Content hash of a read object.
    Md5 {
        /// Upper-case hex MD5 of the (decompressed) body.
        md5: String,
    },
    /// Objects of a listing.
    Objects {
        /// Listed objects in backend order.
        objects: Vec<ObjectInfo>,
    },
    /// Metadata of an object.
    Head(ObjectHead),
    /// All visible buckets.
    Buckets {
        /// The buckets in backend order.
        buckets: Vec<BucketInfo>,
    },
    /// Operations without a result body, and unknown operations.
    Empty {},
}

/// Executes the operation described by `event` against `backend`.
#[tracing::instrument(level = "debug", skip(backend), fields(backend = backend.name()))]
pub async fn execute(backend: &dyn Backend, event: &OpsEvent) -> ServiceResult<OpsResponse> {
    let Some(operation) = Operation::parse(&event.request_type) else {
        tracing::debug!("unknown operation");
        return Ok(OpsResponse::Empty {});
    };

    let bucket = event.bucket.as_str();
    let key = event.key.as_str();

    let response = match operation {
        Operation::GetObject => {
            let response = backend.get_object(bucket, key).await?;
            OpsResponse::Md5 {
                md5: content_md5(response, key).await?,
            }
        }
        Operation::ListObjectsV2 => OpsResponse::Objects {
            objects: backend.list_objects(bucket, None).await?.objects,
        },
        Operation::HeadObject => OpsResponse::Head(backend.head_object(bucket, key).await?),
        Operation::ListBuckets => OpsResponse::Buckets {
            buckets: backend.list_buckets().await?,
        },
        Operation::HeadBucket => {
            backend.head_bucket(bucket).await?;
            OpsResponse::Empty {}
        }
        Operation::PutObject => {
            let body = Bytes::copy_from_slice(event.value.as_bytes());
            backend.put_object(bucket, key, body).await?;
            OpsResponse::Empty {}
        }
        Operation::DeleteObject => {
            backend.delete_object(bucket, key).await?;
            OpsResponse::Empty {}
        }
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::backend::InMemoryBackend;

    fn event(request_type: &str, key: &str, value: &str) -> OpsEvent {
        OpsEvent {
            request_type: request_type.into(),
            bucket: "bucket".into(),
            key: key.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    #[test]
    fn sdk_type_defaults_to_baseline() {
        assert_eq!(SdkType::parse(""), SdkType::S3);
        assert_eq!(SdkType::parse("s3"), SdkType::S3);
        assert_eq!(SdkType::parse("bolt"), SdkType::Bolt);
    }

    #[tokio::test]
    async fn put_get_delete_roundtrip() {
        let backend = InMemoryBackend::new("s3");
        backend.create_bucket("bucket");

        let put = execute(&backend, &event("put_object", "key", "hello world"))
            .await
            .unwrap();
        assert_eq!(serde_json::to_value(put).unwrap(), json!({}));

        let get = execute(&backend, &event("GET_OBJECT", "key", ""))
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_value(get).unwrap(),
            json!({ "md5": "5EB63BBBE01EEED093CB22BB8F5ACDC3" })
        );

        execute(&backend, &event("delete_object", "key", ""))
            .await
            .unwrap();
        assert!(backend.get_stored("bucket", "key").is_none());
    }

    #[tokio::test]
    async fn listing_and_head_shapes() {
        let backend = InMemoryBackend::new("s3");
        backend.insert("bucket", "key", "abc");

        let list = execute(&backend, &event("list_objects_v2", "", ""))
            .await
            .unwrap();
        let list = serde_json::to_value(list).unwrap();
        assert_eq!(list["objects"][0]["Key"], "key");
        assert_eq!(list["objects"][0]["Size"], 3);

        let head = execute(&backend, &event("head_object", "key", ""))
            .await
            .unwrap();
        let head = serde_json::to_value(head).unwrap();
        assert_eq!(head["ContentLength"], 3);
        assert_eq!(head["StorageClass"], "STANDARD");

        let buckets = execute(&backend, &event("list_buckets", "", ""))
            .await
            .unwrap();
        let buckets = serde_json::to_value(buckets).unwrap();
        assert_eq!(buckets["buckets"][0]["Name"], "bucket");
    }

    #[tokio::test]
    async fn unknown_operation_is_empty() {
        let backend = InMemoryBackend::new("s3");

        let response = execute(&backend, &event("copy_object", "key", ""))
            .await
            .unwrap();
        assert_eq!(response, OpsResponse::Empty {});
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn backend_errors_propagate() {
        let backend = InMemoryBackend::new("s3");

        let result = execute(&backend, &event("head_bucket", "", "")).await;
        assert!(result.is_err());
    }
}
