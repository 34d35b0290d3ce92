/// S3-backed blob store operations
use crate::{BlobStore, BlobStoreError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Longest validity S3 accepts for a SigV4 presigned URL (7 days)
pub const MAX_PRESIGN_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Clone)]
pub struct S3Operations {
    client: Arc<Client>,
}

impl S3Operations {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Check that `bucket` is reachable with the configured credentials
    pub async fn head_bucket(&self, bucket: &str) -> Result<(), BlobStoreError> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| BlobStoreError::Request(e.to_string()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl BlobStore for S3Operations {
    async fn sign_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String, BlobStoreError> {
        if ttl.is_zero() || ttl > MAX_PRESIGN_EXPIRY {
            return Err(BlobStoreError::InvalidExpiry(ttl));
        }

        let presigning_config = PresigningConfig::expires_in(ttl)
            .map_err(|e| BlobStoreError::Presign(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| {
                error!(bucket = %bucket, key = %key, error = %e, "failed to presign GetObject");
                BlobStoreError::Presign(e.to_string())
            })?;

        debug!(bucket = %bucket, key = %key, ttl_secs = ttl.as_secs(), "presigned GetObject");
        Ok(request.uri().to_string())
    }
}
