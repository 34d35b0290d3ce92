//! Metadata store: read access to persisted video records

mod video_repo;

pub use video_repo::PgMetadataStore;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use video_core::{Resolution, VideoRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("video not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read-only accessor over persisted video records.
#[async_trait::async_trait]
pub trait MetadataStore: Send + Sync {
    /// Descriptive record and stored file of a video
    async fn fetch_video(&self, id: &str) -> Result<VideoRecord, StoreError>;

    /// Stored file backing `id` at `resolution`
    async fn fetch_file_path(&self, id: &str, resolution: Resolution) -> Result<String, StoreError>;
}

/// Create the PostgreSQL pool backing the metadata store.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await?;

    info!(max_connections, "PostgreSQL pool created");
    Ok(pool)
}
