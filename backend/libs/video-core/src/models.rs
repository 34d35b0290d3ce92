//! Core video data models

use crate::constants::THUMBNAIL_EXTENSION;
use crate::resolution::Resolution;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Descriptive record of a single video, as served to clients and cached.
///
/// Counters default to zero when absent from a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date_created: String,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub dislikes: u64,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub available_resolutions: BTreeSet<Resolution>,
}

impl VideoMetadata {
    /// Build the client-facing record from a stored row.
    pub fn from_record(
        id: &str,
        record: VideoRecord,
        thumb_host: &str,
        available_resolutions: BTreeSet<Resolution>,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: record.title,
            description: record.description,
            date_created: record.date_created,
            views: record.views,
            likes: record.likes,
            dislikes: record.dislikes,
            thumbnail_url: thumbnail_url(thumb_host, id),
            available_resolutions,
        }
    }
}

/// Row shape of the `videos` table as read by the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub title: String,
    pub description: String,
    pub date_created: String,
    pub views: u64,
    pub likes: u64,
    pub dislikes: u64,
    pub file_path: String,
}

/// Stored file backing a video at a given resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoLocation {
    pub id: String,
    pub resolution: Resolution,
    pub file_path: String,
}

/// A signed playback URL together with its validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUrlEntry {
    pub url: String,
    pub file_path: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SignedUrlEntry {
    pub fn new(url: String, file_path: String, issued_at: DateTime<Utc>, validity: Duration) -> Self {
        Self {
            url,
            file_path,
            issued_at,
            expires_at: issued_at + validity,
        }
    }

    /// Validity left at `now`, or `None` once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let left = self.expires_at - now;
        if left > Duration::zero() {
            Some(left)
        } else {
            None
        }
    }

    /// Whether the URL is still valid for at least `margin` after `now`.
    pub fn is_usable(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.remaining(now).map_or(false, |left| left > margin)
    }
}

/// Thumbnail location for a video: `{thumb_host}/{id}.jpg`.
pub fn thumbnail_url(thumb_host: &str, id: &str) -> String {
    format!(
        "{}/{}.{}",
        thumb_host.trim_end_matches('/'),
        id,
        THUMBNAIL_EXTENSION
    )
}
