use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Lifetime of a presigned upload URL.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);
/// Lifetime of a presigned playback URL.
pub const PLAYBACK_URL_TTL: Duration = Duration::from_secs(3 * 3600);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("presigning rejected: {0}")]
    Presign(String),
    #[error("storage backend unavailable: {0}")]
    Backend(String),
}

/// StorageService
///
/// Object storage for course videos. Production uses [`S3StorageClient`], tests use
/// [`MockStorageService`].
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the bucket if missing. Only called in `Env::Local` (MinIO).
    async fn ensure_bucket_exists(&self);

    /// Signed PUT URL for `key`, bound to `content_type` and valid for
    /// [`UPLOAD_URL_TTL`].
    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Signed GET URL for streaming an uploaded video, valid for [`PLAYBACK_URL_TTL`].
    async fn get_presigned_playback_url(&self, key: &str) -> Result<String, StorageError>;
}

/// S3StorageClient
///
/// AWS SDK client pointed at MinIO locally and at the Supabase S3 gateway in
/// production. Both need path-style addressing.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        // CreateBucket on an existing bucket only errors; nothing to do about it.
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!(bucket = %self.bucket_name, error = %e, "create_bucket skipped");
        }
    }

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(UPLOAD_URL_TTL)
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(presigned_req.uri().to_string())
    }

    async fn get_presigned_playback_url(&self, key: &str) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(PLAYBACK_URL_TTL)
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        let presigned_req = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(presigned_req.uri().to_string())
    }
}

/// Strips empty, `.` and `..` segments from a key.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Only video uploads are accepted for course media.
pub fn is_video_content_type(content_type: &str) -> bool {
    content_type
        .strip_prefix("video/")
        .is_some_and(|subtype| {
            !subtype.is_empty() && !subtype.contains(|c: char| c == '/' || c.is_whitespace())
        })
}

/// MockStorageService
///
/// Deterministic, offline `StorageService` for tests.
#[derive(Clone, Default)]
pub struct MockStorageService {
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        if self.should_fail {
            return Err(StorageError::Backend("mock failure requested".to_string()));
        }

        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitize_key(key)
        ))
    }

    async fn get_presigned_playback_url(&self, key: &str) -> Result<String, StorageError> {
        if self.should_fail {
            return Err(StorageError::Backend("mock failure requested".to_string()));
        }

        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?playback=fake",
            sanitize_key(key)
        ))
    }
}

pub type StorageState = Arc<dyn StorageService>;
