//! In-memory backend for tests and local runs.
//!
//! This provides a [`Backend`](super::common::Backend) backed by ordered maps, so listings come
//! back in the same lexicographic order S3 uses. The backend is [`Clone`] so tests can hold a
//! handle for direct inspection while the engine owns a boxed copy.
//!
//! Beyond storage, the backend can simulate the behavior of a real store: a fixed latency per
//! request, failures on selected keys, operations or listings, and a log of all requests in the
//! order they arrived.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;

use super::common::{
    Backend, BackendError, BackendResult, BucketInfo, GetResponse, ListResponse, ObjectHead,
    ObjectInfo,
};
use crate::stream::make_stream;

/// Default page size of a listing, matching S3.
const DEFAULT_MAX_KEYS: usize = 1000;

/// Chunk size of streamed response bodies.
const CHUNK_SIZE: usize = 4096;

type Store = BTreeMap<String, BTreeMap<String, StoredObject>>;

#[derive(Clone, Debug)]
struct StoredObject {
    body: Bytes,
    content_encoding: Option<String>,
}

/// Simulated failures.
///
/// Key faults map to the number of remaining failing requests; `None` fails forever.
#[derive(Debug, Default)]
struct Faults {
    keys: HashMap<String, Option<usize>>,
    operations: HashSet<&'static str>,
    listing: bool,
}

impl Faults {
    fn check_key(&mut self, key: &str) -> BackendResult<()> {
        let Some(remaining) = self.keys.get_mut(key) else {
            return Ok(());
        };

        match remaining {
            Some(0) => return Ok(()),
            Some(n) => *n -= 1,
            None => (),
        }

        Err(BackendError::Injected(format!("request for `{key}`")))
    }
}

/// A request received by an [`InMemoryBackend`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordedRequest {
    /// Name of the backend handle that received the request.
    pub backend: &'static str,
    /// The operation, e.g. `"get"` or `"list"`.
    pub operation: &'static str,
    /// The object key, for object-level operations.
    pub key: Option<String>,
}

/// A [`Backend`] holding all objects in memory.
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    name: &'static str,
    latency: Duration,
    store: Arc<Mutex<Store>>,
    faults: Arc<Mutex<Faults>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl InMemoryBackend {
    /// Creates an empty backend without any buckets.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            latency: Duration::ZERO,
            store: Default::default(),
            faults: Default::default(),
            requests: Default::default(),
        }
    }

    /// Returns a handle with a different name that shares storage and the request log.
    ///
    /// Use this to model a proxy in front of the same store. Latency is inherited, injected
    /// failures are not.
    pub fn renamed(&self, name: &'static str) -> Self {
        Self {
            name,
            latency: self.latency,
            store: Arc::clone(&self.store),
            faults: Default::default(),
            requests: Arc::clone(&self.requests),
        }
    }

    /// Delays every request of this handle by the given duration.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Creates an empty bucket. Existing buckets are left untouched.
    pub fn create_bucket(&self, bucket: &str) {
        self.store
            .lock()
            .unwrap()
            .entry(bucket.to_owned())
            .or_default();
    }

    /// Stores an object directly, creating the bucket if needed.
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        self.insert_object(bucket, key, body.into(), None);
    }

    /// Stores an object that is served with the given `Content-Encoding`.
    pub fn insert_encoded(&self, bucket: &str, key: &str, body: impl Into<Bytes>, encoding: &str) {
        self.insert_object(bucket, key, body.into(), Some(encoding.to_owned()));
    }

    fn insert_object(&self, bucket: &str, key: &str, body: Bytes, encoding: Option<String>) {
        let object = StoredObject {
            body,
            content_encoding: encoding,
        };
        self.store
            .lock()
            .unwrap()
            .entry(bucket.to_owned())
            .or_default()
            .insert(key.to_owned(), object);
    }

    /// Returns the stored body of an object, if present.
    pub fn get_stored(&self, bucket: &str, key: &str) -> Option<Bytes> {
        let store = self.store.lock().unwrap();
        let object = store.get(bucket)?.get(key)?;
        Some(object.body.clone())
    }

    /// Returns all keys of a bucket in listing order.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let store = self.store.lock().unwrap();
        store
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Fails every request for the given key on this handle.
    pub fn fail_on_key(&self, key: &str) {
        self.faults
            .lock()
            .unwrap()
            .keys
            .insert(key.to_owned(), None);
    }

    /// Fails the next `times` requests for the given key on this handle.
    pub fn fail_on_key_times(&self, key: &str, times: usize) {
        self.faults
            .lock()
            .unwrap()
            .keys
            .insert(key.to_owned(), Some(times));
    }

    /// Fails every request of the given operation on this handle, e.g. `"delete"`.
    pub fn fail_operation(&self, operation: &'static str) {
        self.faults.lock().unwrap().operations.insert(operation);
    }

    /// Fails every listing request on this handle.
    pub fn fail_listing(&self) {
        self.faults.lock().unwrap().listing = true;
    }

    /// Returns all requests received so far, across all handles sharing this store.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Records the request, waits for the simulated latency and applies injected faults.
    async fn begin(&self, operation: &'static str, key: Option<&str>) -> BackendResult<()> {
        self.requests.lock().unwrap().push(RecordedRequest {
            backend: self.name,
            operation,
            key: key.map(str::to_owned),
        });

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut faults = self.faults.lock().unwrap();
        if faults.operations.contains(operation) {
            return Err(BackendError::Injected(format!(
                "{operation} on `{}`",
                self.name
            )));
        }

        match key {
            Some(key) => faults.check_key(key),
            None if faults.listing => Err(BackendError::Injected(format!(
                "{operation} on `{}`",
                self.name
            ))),
            None => Ok(()),
        }
    }

    fn with_bucket<T>(
        &self,
        bucket: &str,
        f: impl FnOnce(&mut BTreeMap<String, StoredObject>) -> BackendResult<T>,
    ) -> BackendResult<T> {
        let mut store = self.store.lock().unwrap();
        let objects = store
            .get_mut(bucket)
            .ok_or_else(|| BackendError::NoSuchBucket(bucket.to_owned()))?;
        f(objects)
    }

    fn not_found(bucket: &str, key: &str) -> BackendError {
        BackendError::NotFound {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        }
    }
}

#[async_trait::async_trait]
impl Backend for InMemoryBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn list_objects(
        &self,
        bucket: &str,
        max_keys: Option<usize>,
    ) -> BackendResult<ListResponse> {
        self.begin("list", None).await?;

        self.with_bucket(bucket, |objects| {
            let objects: Vec<_> = objects
                .iter()
                .take(max_keys.unwrap_or(DEFAULT_MAX_KEYS))
                .map(|(key, object)| ObjectInfo {
                    key: key.clone(),
                    size: object.body.len() as u64,
                    storage_class: Some("STANDARD".to_owned()),
                    ..Default::default()
                })
                .collect();

            Ok(ListResponse {
                key_count: objects.len(),
                objects,
            })
        })
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> BackendResult<()> {
        self.begin("put", Some(key)).await?;

        self.with_bucket(bucket, |objects| {
            let object = StoredObject {
                body,
                content_encoding: None,
            };
            objects.insert(key.to_owned(), object);
            Ok(())
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> BackendResult<()> {
        self.begin("delete", Some(key)).await?;

        self.with_bucket(bucket, |objects| {
            objects.remove(key);
            Ok(())
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<GetResponse> {
        self.begin("get", Some(key)).await?;

        let object = self.with_bucket(bucket, |objects| {
            objects
                .get(key)
                .cloned()
                .ok_or_else(|| Self::not_found(bucket, key))
        })?;

        Ok(GetResponse {
            content_encoding: object.content_encoding,
            content_length: object.body.len() as u64,
            stream: make_stream(object.body, CHUNK_SIZE),
        })
    }

    async fn head_object(&self, bucket: &str, key: &str) -> BackendResult<ObjectHead> {
        self.begin("head", Some(key)).await?;

        self.with_bucket(bucket, |objects| {
            let object = objects
                .get(key)
                .ok_or_else(|| Self::not_found(bucket, key))?;

            Ok(ObjectHead {
                storage_class: Some("STANDARD".to_owned()),
                content_length: object.body.len() as u64,
                ..Default::default()
            })
        })
    }

    async fn list_buckets(&self) -> BackendResult<Vec<BucketInfo>> {
        self.begin("list_buckets", None).await?;

        let store = self.store.lock().unwrap();
        let buckets = store
            .keys()
            .map(|name| BucketInfo {
                name: name.clone(),
                creation_date: None,
            })
            .collect();

        Ok(buckets)
    }

    async fn head_bucket(&self, bucket: &str) -> BackendResult<()> {
        self.begin("head_bucket", None).await?;
        self.with_bucket(bucket, |_| Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::read_to_vec;

    #[tokio::test]
    async fn stores_and_serves_objects() {
        let backend = InMemoryBackend::new("memory");
        backend.create_bucket("bucket");

        backend
            .put_object("bucket", "key", Bytes::from_static(b"payload"))
            .await
            .unwrap();

        let response = backend.get_object("bucket", "key").await.unwrap();
        assert_eq!(response.content_length, 7);
        assert_eq!(response.content_encoding, None);
        assert_eq!(read_to_vec(response.stream).await.unwrap(), b"payload");

        backend.delete_object("bucket", "key").await.unwrap();
        let result = backend.get_object("bucket", "key").await;
        assert!(matches!(result, Err(BackendError::NotFound { .. })));
    }

    #[tokio::test]
    async fn missing_bucket_is_an_error() {
        let backend = InMemoryBackend::new("memory");

        let result = backend.put_object("nope", "key", Bytes::new()).await;
        assert!(matches!(result, Err(BackendError::NoSuchBucket(_))));
        assert!(backend.head_bucket("nope").await.is_err());
    }

    #[tokio::test]
    async fn listing_is_sorted_and_capped() {
        let backend = InMemoryBackend::new("memory");
        for key in ["c", "a", "d", "b"] {
            backend.insert("bucket", key, "x");
        }

        let listing = backend.list_objects("bucket", Some(3)).await.unwrap();
        assert_eq!(listing.key_count, 3);
        assert_eq!(listing.into_keys(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn renamed_handle_shares_store_but_not_faults() {
        let baseline = InMemoryBackend::new("s3");
        let proxy = baseline.renamed("bolt");
        baseline.insert("bucket", "key", "x");
        proxy.fail_on_key("key");

        assert!(baseline.get_object("bucket", "key").await.is_ok());
        assert!(proxy.get_object("bucket", "key").await.is_err());

        let backends: Vec<_> = baseline.requests().iter().map(|r| r.backend).collect();
        assert_eq!(backends, ["s3", "bolt"]);
    }

    #[tokio::test]
    async fn limited_failures_recover() {
        let backend = InMemoryBackend::new("memory");
        backend.insert("bucket", "key", "x");
        backend.fail_on_key_times("key", 2);

        assert!(backend.head_object("bucket", "key").await.is_err());
        assert!(backend.head_object("bucket", "key").await.is_err());
        assert!(backend.head_object("bucket", "key").await.is_ok());
    }

    #[tokio::test]
    async fn operation_faults_leave_other_operations_working() {
        let backend = InMemoryBackend::new("memory");
        backend.insert("bucket", "key", "x");
        backend.fail_operation("delete");
        backend.fail_listing();

        assert!(backend.get_object("bucket", "key").await.is_ok());
        let result = backend.delete_object("bucket", "key").await;
        assert!(matches!(result, Err(BackendError::Injected(_))));
        assert!(backend.list_objects("bucket", None).await.is_err());
        assert_eq!(backend.keys("bucket"), ["key"]);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_is_simulated() {
        let backend = InMemoryBackend::new("memory").with_latency(Duration::from_millis(25));
        backend.create_bucket("bucket");

        let start = tokio::time::Instant::now();
        backend.list_objects("bucket", None).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(25));
    }
}
