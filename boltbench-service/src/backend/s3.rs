//! Backend adapter for Amazon S3 and S3-compatible proxies.

use std::fmt;

use aws_config::meta::region::RegionProviderChain;
use aws_config::{AppName, BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::{ByteStream, DateTime, DateTimeFormat};
use bytes::Bytes;
use futures_util::StreamExt;
use tokio_util::io::ReaderStream;

use super::common::{
    APP_NAME, Backend, BackendError, BackendResult, BucketInfo, GetResponse, ListResponse,
    ObjectHead, ObjectInfo,
};

/// Region used when neither the configuration nor the environment provides one.
const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for an [`S3Backend`].
#[derive(Clone, Debug, Default)]
pub struct S3BackendConfig {
    /// Custom endpoint URL. Set this for proxies and S3-compatible services.
    pub endpoint: Option<String>,
    /// Signing region. Falls back to the default AWS provider chain.
    pub region: Option<String>,
    /// Use path-style addressing (`endpoint/bucket/key`) instead of virtual hosts.
    pub force_path_style: bool,
}

/// A backend talking the S3 protocol.
///
/// The same adapter serves the baseline store (default AWS endpoint) and the proxy in front of it
/// (custom endpoint). Credentials are resolved through the default AWS provider chain.
pub struct S3Backend {
    name: &'static str,
    endpoint: Option<String>,
    client: Client,
}

impl S3Backend {
    /// Creates a new S3 backend with the given diagnostics name.
    pub async fn new(name: &'static str, config: S3BackendConfig) -> Self {
        let region = RegionProviderChain::first_try(config.region.map(Region::new))
            .or_default_provider()
            .or_else(Region::new(DEFAULT_REGION));

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
        if let Ok(app_name) = AppName::new(APP_NAME) {
            loader = loader.app_name(app_name);
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style);
        if let Some(ref endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            name,
            endpoint: config.endpoint,
            client: Client::from_conf(builder.build()),
        }
    }
}

impl fmt::Debug for S3Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Backend")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

fn format_date(date: &DateTime) -> Option<String> {
    date.fmt(DateTimeFormat::DateTime).ok()
}

fn to_u64(value: Option<i64>) -> u64 {
    value.unwrap_or_default().max(0) as u64
}

#[async_trait::async_trait]
impl Backend for S3Backend {
    fn name(&self) -> &'static str {
        self.name
    }

    #[tracing::instrument(level = "trace", fields(backend = self.name), skip(self))]
    async fn list_objects(
        &self,
        bucket: &str,
        max_keys: Option<usize>,
    ) -> BackendResult<ListResponse> {
        let mut request = self.client.list_objects_v2().bucket(bucket);
        if let Some(max_keys) = max_keys {
            request = request.max_keys(i32::try_from(max_keys).unwrap_or(i32::MAX));
        }

        let output = request
            .send()
            .await
            .map_err(|e| BackendError::s3(format!("listing objects in `{bucket}`"), e))?;

        let objects: Vec<_> = output
            .contents()
            .iter()
            .map(|object| ObjectInfo {
                key: object.key().unwrap_or_default().to_owned(),
                last_modified: object.last_modified().and_then(format_date),
                etag: object.e_tag().map(str::to_owned),
                size: to_u64(object.size()),
                storage_class: object.storage_class().map(|class| class.as_str().to_owned()),
            })
            .collect();

        let key_count = match output.key_count() {
            Some(count) => count.max(0) as usize,
            None => objects.len(),
        };

        Ok(ListResponse { objects, key_count })
    }

    #[tracing::instrument(level = "trace", fields(backend = self.name), skip(self, body))]
    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> BackendResult<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| BackendError::s3(format!("writing `{key}` to `{bucket}`"), e))?;

        Ok(())
    }

    #[tracing::instrument(level = "trace", fields(backend = self.name), skip(self))]
    async fn delete_object(&self, bucket: &str, key: &str) -> BackendResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| BackendError::s3(format!("deleting `{key}` from `{bucket}`"), e))?;

        Ok(())
    }

    #[tracing::instrument(level = "trace", fields(backend = self.name), skip(self))]
    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<GetResponse> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .customize()
            .mutate_request(|request| {
                request.headers_mut().insert("Accept-Encoding", "gzip");
            })
            .send()
            .await
            .map_err(|e| BackendError::s3(format!("reading `{key}` from `{bucket}`"), e))?;

        let content_encoding = output.content_encoding().map(str::to_owned);
        let content_length = to_u64(output.content_length());
        let stream = ReaderStream::new(output.body.into_async_read()).boxed();

        Ok(GetResponse {
            content_encoding,
            content_length,
            stream,
        })
    }

    #[tracing::instrument(level = "trace", fields(backend = self.name), skip(self))]
    async fn head_object(&self, bucket: &str, key: &str) -> BackendResult<ObjectHead> {
        let output = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| BackendError::s3(format!("inspecting `{key}` in `{bucket}`"), e))?;

        Ok(ObjectHead {
            etag: output.e_tag().map(str::to_owned),
            storage_class: output.storage_class().map(|class| class.as_str().to_owned()),
            last_modified: output.last_modified().and_then(format_date),
            content_length: to_u64(output.content_length()),
        })
    }

    #[tracing::instrument(level = "trace", fields(backend = self.name), skip(self))]
    async fn list_buckets(&self) -> BackendResult<Vec<BucketInfo>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| BackendError::s3("listing buckets", e))?;

        let buckets = output
            .buckets()
            .iter()
            .map(|bucket| BucketInfo {
                name: bucket.name().unwrap_or_default().to_owned(),
                creation_date: bucket.creation_date().and_then(format_date),
            })
            .collect();

        Ok(buckets)
    }

    #[tracing::instrument(level = "trace", fields(backend = self.name), skip(self))]
    async fn head_bucket(&self, bucket: &str) -> BackendResult<()> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| BackendError::s3(format!("inspecting bucket `{bucket}`"), e))?;

        Ok(())
    }
}
