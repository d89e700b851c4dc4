//! The set of keys a benchmark operates on.

use boltbench_service::Backend;

use crate::error::{BenchError, BenchResult};

/// Prefix of generated keys.
pub const KEY_PREFIX: &str = "bolt-s3-perf";

/// An ordered list of object keys.
///
/// Writes operate on generated keys, reads on keys discovered in the bucket. The order is the
/// order in which requests are issued.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WorkingSet {
    keys: Vec<String>,
}

impl WorkingSet {
    /// Generates `count` keys named `bolt-s3-perf0` through `bolt-s3-perf{count-1}`.
    pub fn generate(count: usize) -> Self {
        let keys = (0..count).map(|i| format!("{KEY_PREFIX}{i}")).collect();
        Self { keys }
    }

    /// Lists up to `limit` keys of `bucket` in the backend's listing order.
    ///
    /// Keys are always discovered from a single store so that both stores are read with the same
    /// keys. Only the first listing page is consulted.
    pub async fn discover(backend: &dyn Backend, bucket: &str, limit: usize) -> BenchResult<Self> {
        let listing = backend
            .list_objects(bucket, Some(limit))
            .await
            .map_err(|cause| BenchError::Backend {
                backend: backend.name(),
                operation: "list",
                target: bucket.to_owned(),
                cause,
            })?;

        let mut keys = listing.into_keys();
        keys.truncate(limit);

        tracing::debug!(bucket, count = keys.len(), "discovered keys");
        Ok(Self { keys })
    }

    /// The keys in request order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Iterates over the keys in request order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// The number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl From<Vec<String>> for WorkingSet {
    fn from(keys: Vec<String>) -> Self {
        Self { keys }
    }
}

#[cfg(test)]
mod tests {
    use boltbench_service::InMemoryBackend;

    use super::*;

    #[test]
    fn generated_keys_are_numbered() {
        let keys = WorkingSet::generate(3);
        assert_eq!(
            keys.keys(),
            ["bolt-s3-perf0", "bolt-s3-perf1", "bolt-s3-perf2"]
        );
        assert!(WorkingSet::generate(0).is_empty());
    }

    #[tokio::test]
    async fn discovery_is_capped() {
        let backend = InMemoryBackend::new("s3");
        for key in ["d", "b", "a", "c"] {
            backend.insert("bucket", key, "x");
        }

        let keys = WorkingSet::discover(&backend, "bucket", 2).await.unwrap();
        assert_eq!(keys.keys(), ["a", "b"]);
    }

    #[tokio::test]
    async fn discovery_of_an_empty_bucket_is_empty() {
        let backend = InMemoryBackend::new("s3");
        backend.create_bucket("bucket");

        let keys = WorkingSet::discover(&backend, "bucket", 1000)
            .await
            .unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn discovery_failures_name_the_backend() {
        let backend = InMemoryBackend::new("s3");

        let error = WorkingSet::discover(&backend, "missing", 10)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            BenchError::Backend {
                backend: "s3",
                operation: "list",
                ..
            }
        ));
    }
}
