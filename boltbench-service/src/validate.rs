//! Byte-level comparison of an object as served by the baseline store and the proxy.
//!
//! Both bodies are hashed with MD5. Compressed objects are decompressed first, so a proxy that
//! serves a gzip-encoded copy of a plain object still validates.

use async_compression::tokio::bufread::GzipDecoder;
use md5::{Digest, Md5};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::StreamReader;

use crate::backend::{Backend, GetResponse};
use crate::error::ServiceResult;

/// Read buffer size used while hashing.
const BUFFER_SIZE: usize = 8192;

/// Content hashes of one object on both stores.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Validation {
    /// Hash of the baseline copy. Absent if the baseline was not consulted.
    #[serde(rename = "s3-md5", skip_serializing_if = "Option::is_none")]
    pub baseline_md5: Option<String>,
    /// Hash of the proxy copy.
    #[serde(rename = "bolt-md5")]
    pub proxy_md5: String,
}

impl Validation {
    /// Returns `true` if both hashes are present and equal.
    pub fn is_match(&self) -> bool {
        self.baseline_md5.as_deref() == Some(self.proxy_md5.as_str())
    }
}

/// Fetches `key` from both stores and hashes their contents.
///
/// With `bucket_clean` set, the baseline copy is assumed to be gone and only the proxy is read.
#[tracing::instrument(level = "debug", skip(baseline, proxy))]
pub async fn validate_object(
    baseline: &dyn Backend,
    proxy: &dyn Backend,
    bucket: &str,
    key: &str,
    bucket_clean: bool,
) -> ServiceResult<Validation> {
    let proxy_response = proxy.get_object(bucket, key).await?;

    let baseline_md5 = if bucket_clean {
        None
    } else {
        let response = baseline.get_object(bucket, key).await?;
        Some(content_md5(response, key).await?)
    };

    let proxy_md5 = content_md5(proxy_response, key).await?;

    let validation = Validation {
        baseline_md5,
        proxy_md5,
    };
    tracing::debug!(matches = validation.is_match(), "validated object");
    Ok(validation)
}

/// Computes the upper-case hex MD5 of a response body, decompressing compressed objects.
pub async fn content_md5(response: GetResponse, key: &str) -> std::io::Result<String> {
    let compressed = response.is_compressed(key);
    let reader = StreamReader::new(response.stream);

    let digest = if compressed {
        hash_reader(GzipDecoder::new(reader)).await?
    } else {
        hash_reader(reader).await?
    };

    Ok(digest)
}

async fn hash_reader<R>(mut reader: R) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = Md5::new();
    let mut buf = vec![0; BUFFER_SIZE];
    loop {
        let read = reader.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(format!("{:X}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use async_compression::tokio::write::GzipEncoder;
    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::backend::InMemoryBackend;

    // MD5 of "hello world"
    const HELLO_MD5: &str = "5EB63BBBE01EEED093CB22BB8F5ACDC3";

    async fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzipEncoder::new(Vec::new());
        encoder.write_all(data).await.unwrap();
        encoder.shutdown().await.unwrap();
        encoder.into_inner()
    }

    #[tokio::test]
    async fn matching_plain_objects() {
        let baseline = InMemoryBackend::new("s3");
        let proxy = baseline.renamed("bolt");
        baseline.insert("bucket", "hello.txt", "hello world");

        let validation = validate_object(&baseline, &proxy, "bucket", "hello.txt", false)
            .await
            .unwrap();

        assert_eq!(validation.baseline_md5.as_deref(), Some(HELLO_MD5));
        assert_eq!(validation.proxy_md5, HELLO_MD5);
        assert!(validation.is_match());
    }

    #[tokio::test]
    async fn gzip_encoded_objects_are_decompressed() {
        let baseline = InMemoryBackend::new("s3");
        let proxy = InMemoryBackend::new("bolt");
        baseline.insert("bucket", "hello.txt", "hello world");
        proxy.insert_encoded("bucket", "hello.txt", gzip(b"hello world").await, "gzip");

        let validation = validate_object(&baseline, &proxy, "bucket", "hello.txt", false)
            .await
            .unwrap();

        assert!(validation.is_match());
    }

    #[tokio::test]
    async fn gz_suffix_is_decompressed() {
        let baseline = InMemoryBackend::new("s3");
        let proxy = baseline.renamed("bolt");
        baseline.insert("bucket", "hello.gz", gzip(b"hello world").await);

        let validation = validate_object(&baseline, &proxy, "bucket", "hello.gz", false)
            .await
            .unwrap();

        assert_eq!(validation.proxy_md5, HELLO_MD5);
    }

    #[tokio::test]
    async fn clean_bucket_skips_baseline() {
        let baseline = InMemoryBackend::new("s3");
        let proxy = InMemoryBackend::new("bolt");
        proxy.insert("bucket", "hello.txt", "hello world");

        let validation = validate_object(&baseline, &proxy, "bucket", "hello.txt", true)
            .await
            .unwrap();

        assert_eq!(validation.baseline_md5, None);
        assert!(baseline.requests().is_empty());

        let json = serde_json::to_value(&validation).unwrap();
        assert_eq!(json, serde_json::json!({ "bolt-md5": HELLO_MD5 }));
    }

    #[tokio::test]
    async fn missing_object_fails() {
        let baseline = InMemoryBackend::new("s3");
        let proxy = baseline.renamed("bolt");
        baseline.create_bucket("bucket");

        let result = validate_object(&baseline, &proxy, "bucket", "missing", false).await;
        assert!(result.is_err());
    }
}
