/// Blob store access for the video hosting service
///
/// Provides the `BlobStore` contract used by the repository layer and its
/// S3 implementation.
use aws_sdk_s3::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod config;
pub mod operations;

pub use config::S3Config;
pub use operations::{S3Operations, MAX_PRESIGN_EXPIRY};

#[derive(Error, Debug)]
pub enum BlobStoreError {
    #[error("presigning failed: {0}")]
    Presign(String),

    #[error("blob store request failed: {0}")]
    Request(String),

    #[error("unsupported presign expiry: {0:?}")]
    InvalidExpiry(Duration),
}

/// Issues time-limited signed URLs for stored objects.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Mint a URL granting read access to `bucket/key` for `ttl`.
    async fn sign_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String, BlobStoreError>;
}

/// Shared S3 client wrapper
#[derive(Clone)]
pub struct S3Client {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Client {
    /// Create new S3 client from configuration, honouring a custom endpoint
    /// and path-style addressing for S3-compatible stores.
    pub async fn with_config(config: S3Config) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder =
            aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Arc::new(Client::from_conf(builder.build())),
            config,
        }
    }

    /// Blob store operations over this client
    pub fn operations(&self) -> S3Operations {
        S3Operations::new(self.client.clone())
    }

    /// Health check for S3 connectivity
    pub async fn health_check(&self) -> Result<(), BlobStoreError> {
        self.operations().head_bucket(&self.config.bucket).await
    }
}
