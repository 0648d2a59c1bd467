use crate::traits::{ObjectByteStream, ObjectInfo, ObjectTier, TierError, TierResult};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::{RetryConfig, RetryMode};
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use futures::StreamExt;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use vodcast_core::config::S3TierConfig;
use vodcast_core::StorageTier;

/// S3-compatible tier. Used for both the primary and secondary tiers with
/// distinct bucket/region/endpoint configuration.
#[derive(Clone)]
pub struct S3Tier {
    tier: StorageTier,
    client: Client,
    bucket: String,
}

impl S3Tier {
    /// Create an S3 tier client.
    ///
    /// A custom `endpoint` switches the client to path-style addressing for
    /// S3-compatible providers (MinIO, DigitalOcean Spaces, etc.).
    pub async fn new(tier: StorageTier, cfg: &S3TierConfig) -> TierResult<Self> {
        let region_provider =
            RegionProviderChain::first_try(aws_config::Region::new(cfg.region.clone()));

        let retry_config = RetryConfig::standard()
            .with_max_attempts(5)
            .with_retry_mode(RetryMode::Adaptive);

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .retry_config(retry_config.clone())
            .load()
            .await;

        let client = if let Some(ref endpoint) = cfg.endpoint {
            let mut s3_config_builder = aws_sdk_s3::Config::builder()
                .endpoint_url(endpoint)
                .region(sdk_config.region().cloned())
                .retry_config(retry_config);
            if let Some(provider) = sdk_config.credentials_provider().into_iter().next() {
                s3_config_builder = s3_config_builder.credentials_provider(provider);
            }
            // Path-style addressing is required by most S3-compatible providers
            s3_config_builder = s3_config_builder.force_path_style(true);
            Client::from_conf(s3_config_builder.build())
        } else {
            Client::new(&sdk_config)
        };

        Ok(S3Tier {
            tier,
            client,
            bucket: cfg.bucket.clone(),
        })
    }
}

#[async_trait]
impl ObjectTier for S3Tier {
    fn id(&self) -> StorageTier {
        self.tier
    }

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> TierResult<()> {
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    tier = %self.tier,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 put failed"
                );
                TierError::PutFailed(e.to_string())
            })?;

        tracing::info!(
            tier = %self.tier,
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 put successful"
        );

        Ok(())
    }

    async fn head(&self, key: &str) -> TierResult<ObjectInfo> {
        let response = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(service_err) => match service_err.err() {
                    HeadObjectError::NotFound(_) => TierError::NotFound(key.to_string()),
                    _ => TierError::Backend(e.to_string()),
                },
                _ => TierError::Backend(e.to_string()),
            })?;

        let size_bytes = response
            .content_length()
            .and_then(|len| u64::try_from(len).ok())
            .ok_or_else(|| {
                TierError::Backend(format!("No content length in head response for {}", key))
            })?;

        Ok(ObjectInfo { size_bytes })
    }

    async fn get_range(&self, key: &str, start: u64, end: u64) -> TierResult<ObjectByteStream> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .range(format!("bytes={}-{}", start, end))
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(service_err) => match service_err.err() {
                    GetObjectError::NoSuchKey(_) => TierError::NotFound(key.to_string()),
                    _ => TierError::ReadFailed(e.to_string()),
                },
                _ => TierError::ReadFailed(e.to_string()),
            })?;

        tracing::debug!(
            tier = %self.tier,
            bucket = %self.bucket,
            key = %key,
            range_start = start,
            range_end = end,
            "S3 range read opened"
        );

        let async_read = response.body.into_async_read();
        let stream = ReaderStream::new(async_read)
            .map(|result| result.map_err(|e| TierError::ReadFailed(e.to_string())));

        Ok(Box::pin(stream))
    }

    async fn delete(&self, key: &str) -> TierResult<()> {
        let start = std::time::Instant::now();

        // S3 DeleteObject is already idempotent: deleting a missing key succeeds.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    tier = %self.tier,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                TierError::DeleteFailed(e.to_string())
            })?;

        tracing::info!(
            tier = %self.tier,
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> TierResult<String> {
        let presigning_config = aws_sdk_s3::presigning::PresigningConfig::builder()
            .expires_in(expires_in)
            .build()
            .map_err(|e| TierError::Backend(e.to_string()))?;

        let presigned_request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| TierError::Backend(e.to_string()))?;

        Ok(presigned_request.uri().to_string())
    }

    async fn delete_prefix(&self, prefix: &str) -> TierResult<()> {
        let start = std::time::Instant::now();
        let mut deleted = 0usize;
        let mut continuation_token = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);

            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| TierError::Backend(e.to_string()))?;

            for obj in response.contents() {
                if let Some(key) = obj.key() {
                    self.client
                        .delete_object()
                        .bucket(&self.bucket)
                        .key(key)
                        .send()
                        .await
                        .map_err(|e| TierError::DeleteFailed(e.to_string()))?;
                    deleted += 1;
                }
            }

            if response.is_truncated().unwrap_or(false) {
                continuation_token = response.next_continuation_token().map(String::from);
            } else {
                break;
            }
        }

        tracing::info!(
            tier = %self.tier,
            bucket = %self.bucket,
            prefix = %prefix,
            deleted,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 prefix delete completed"
        );

        Ok(())
    }
}
