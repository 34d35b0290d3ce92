//! Video hosting constants

/// Bucket holding the original uploads
pub const DEFAULT_VIDEO_BUCKET: &str = "videos";

/// Validity window of a signed playback URL (24 hours)
pub const SIGNED_URL_VALIDITY_SECS: u64 = 24 * 60 * 60;

/// Extension appended to the video id to build its thumbnail URL
pub const THUMBNAIL_EXTENSION: &str = "jpg";

/// Default TTL for cached video metadata (5 minutes)
pub const DEFAULT_VIDEO_INFO_TTL_SECS: u64 = 5 * 60;

/// Default TTL for cached (id, resolution) -> file path mappings (1 hour)
pub const DEFAULT_VIDEO_LOCATION_TTL_SECS: u64 = 60 * 60;

/// Minimum remaining validity a cached signed URL must have to be served
pub const DEFAULT_SIGNED_URL_SAFETY_MARGIN_SECS: u64 = 60;
