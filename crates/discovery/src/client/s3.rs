//! Object store client for S3-compatible services.
//!
//! Works with AWS S3 and anything speaking the same API (Backblaze B2,
//! MinIO, Tigris). Credentials are explicit; each configured backend brings
//! its own `key_id` and `key_secret`.

use super::{ObjectPage, ObjectRecord, ObjectStoreClient};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region, retry::RetryConfig};
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::operation::list_objects::ListObjectsOutput;
use exn::ResultExt;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Generous default for concurrent S3 requests.
const DEFAULT_CONCURRENT_REQUESTS: usize = 100;

/// S3 client for flat-namespace discovery.
///
/// Retries are disabled: a failed request surfaces straight away as
/// [`BackendUnavailable`](ErrorKind::BackendUnavailable) and the caller
/// decides what to do about it.
///
/// # Examples
///
/// ```no_run
/// use omnifind_discovery::client::S3Client;
///
/// let client = S3Client::new(
///     "us-west-004",
///     Some("https://s3.us-west-004.backblazeb2.com"),
///     "access_key_id",
///     "secret_access_key",
/// );
/// ```
#[derive(Debug, Clone)]
pub struct S3Client {
    client: Client,
    /// Rate limiter for concurrent S3 requests.
    rate_limiter: Arc<Semaphore>,
}

impl S3Client {
    /// # Arguments
    /// * `region` - AWS region or provider-specific region (e.g., "us-west-004" for Backblaze)
    /// * `endpoint` - Custom endpoint URL for S3-compatible services
    /// * `key_id` - Access key ID
    /// * `key_secret` - Secret access key
    pub fn new(
        region: impl Into<String>,
        endpoint: Option<impl Into<String>>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        let credentials = Credentials::new(key_id, key_secret, None, None, "omnifind-config");
        let mut config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region.into()))
            .retry_config(RetryConfig::disabled())
            // Path-style addressing for S3-compatible services.
            .force_path_style(true);
        if let Some(endpoint_url) = endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }
        Self::from_client(Client::from_conf(config_builder.build()))
    }

    /// Wrap an already-configured SDK client.
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            rate_limiter: Arc::new(Semaphore::new(DEFAULT_CONCURRENT_REQUESTS)),
        }
    }

    async fn acquire_permit(&self) -> Result<OwnedSemaphorePermit> {
        self.rate_limiter
            .clone()
            .acquire_owned()
            .await
            .or_raise(|| ErrorKind::backend("S3 rate limiter closed"))
    }
}

/// Convert a listing response into a page.
///
/// Without a delimiter S3 leaves `NextMarker` out even on truncated pages;
/// the last key of the page is the marker then.
fn page_from_output(output: ListObjectsOutput) -> ObjectPage {
    let objects: Vec<_> = output
        .contents()
        .iter()
        .map(|object| ObjectRecord::new(object.key().unwrap_or_default(), object.e_tag()))
        .collect();
    let is_truncated = output.is_truncated().unwrap_or(false);
    let next_marker = match output.next_marker() {
        Some(marker) => Some(marker.to_string()),
        None if is_truncated => objects.last().map(|object| object.key.clone()),
        None => None,
    };
    ObjectPage { objects, next_marker, is_truncated }
}

#[async_trait]
impl ObjectStoreClient for S3Client {
    async fn fetch_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectRecord>> {
        let _permit = self.acquire_permit().await?;
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(output) => Ok(Some(ObjectRecord::new(key, output.e_tag()))),
            Err(err) if err.as_service_error().is_some_and(HeadObjectError::is_not_found) => Ok(None),
            Err(err) => Err(err).or_raise(|| ErrorKind::backend(format!("HeadObject {bucket}/{key} failed"))),
        }
    }

    async fn list_objects(&self, bucket: &str, marker: Option<&str>) -> Result<ObjectPage> {
        let _permit = self.acquire_permit().await?;
        let output = self
            .client
            .list_objects()
            .bucket(bucket)
            .set_marker(marker.map(str::to_string))
            .send()
            .await
            .or_raise(|| ErrorKind::backend(format!("ListObjects {bucket} failed")))?;
        Ok(page_from_output(output))
    }
}
