/// Video queries - database operations for video records
use super::{MetadataStore, StoreError};
use sqlx::PgPool;
use tracing::warn;
use video_core::{Resolution, VideoRecord};

#[derive(Debug, sqlx::FromRow)]
struct VideoRow {
    title: String,
    description: String,
    date_created: String,
    view_count: i64,
    likes: i64,
    dislikes: i64,
    file_path: String,
}

impl From<VideoRow> for VideoRecord {
    fn from(row: VideoRow) -> Self {
        VideoRecord {
            title: row.title,
            description: row.description,
            date_created: row.date_created,
            views: counter("view_count", row.view_count),
            likes: counter("likes", row.likes),
            dislikes: counter("dislikes", row.dislikes),
            file_path: row.file_path,
        }
    }
}

/// Negative counters are corrupt rows; they read as zero.
fn counter(column: &'static str, value: i64) -> u64 {
    u64::try_from(value).unwrap_or_else(|_| {
        warn!(column, value, "negative counter in videos row, reading as zero");
        0
    })
}

async fn find_video_by_id(pool: &PgPool, id: &str) -> Result<Option<VideoRow>, sqlx::Error> {
    sqlx::query_as::<_, VideoRow>(
        r#"
        SELECT title,
               COALESCE(description, '') AS description,
               date_uploaded::text AS date_created,
               COALESCE(view_count, 0)::bigint AS view_count,
               COALESCE(likes, 0)::bigint AS likes,
               COALESCE(dislikes, 0)::bigint AS dislikes,
               file_path
        FROM videos
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

// All renditions currently resolve to the uploaded file; a per-resolution
// table is expected once transcoding lands.
async fn find_file_path(pool: &PgPool, id: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT file_path FROM videos WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// PostgreSQL-backed metadata store
#[derive(Clone)]
pub struct PgMetadataStore {
    pool: PgPool,
}

impl PgMetadataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MetadataStore for PgMetadataStore {
    async fn fetch_video(&self, id: &str) -> Result<VideoRecord, StoreError> {
        find_video_by_id(&self.pool, id)
            .await?
            .map(VideoRecord::from)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn fetch_file_path(&self, id: &str, _resolution: Resolution) -> Result<String, StoreError> {
        find_file_path(&self.pool, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
