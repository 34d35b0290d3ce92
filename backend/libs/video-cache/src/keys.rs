//! Unified cache key schema
//!
//! Key format: v{VERSION}:{entity}:{identifier}[:sub_key]
//! Bumping the version orphans every entry written under the old payload schema.

/// Cache schema version - increment when changing key or payload formats
pub const CACHE_VERSION: u32 = 1;

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Video metadata, keyed by video id
    /// Format: v1:video:{id}
    pub fn video(id: &str) -> String {
        format!("v{}:video:{}", CACHE_VERSION, id)
    }

    /// Stored file for a video at one resolution
    /// Format: v1:video_location:{id}:{resolution}
    pub fn video_location(id: &str, resolution: &str) -> String {
        format!("v{}:video_location:{}:{}", CACHE_VERSION, id, resolution)
    }

    /// Signed playback URL, keyed by stored file path so resolutions that
    /// share a file share one signature
    /// Format: v1:signed_url:{file_path}
    pub fn signed_url(file_path: &str) -> String {
        format!("v{}:signed_url:{}", CACHE_VERSION, file_path)
    }

    /// Extract entity type from key
    pub fn entity_type(key: &str) -> Option<&str> {
        let mut parts = key.splitn(3, ':');
        let version = parts.next()?;
        let entity = parts.next()?;
        if version.starts_with('v') && !entity.is_empty() {
            Some(entity)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_key() {
        assert_eq!(CacheKey::video("v1"), "v1:video:v1");
    }

    #[test]
    fn test_location_key_separates_id_and_resolution() {
        // "v1" + "720p" and "v17" + "20p" must not collide
        assert_ne!(
            CacheKey::video_location("v1", "720p"),
            CacheKey::video_location("v17", "20p")
        );
        assert_eq!(
            CacheKey::video_location("v1", "720p"),
            "v1:video_location:v1:720p"
        );
    }

    #[test]
    fn test_signed_url_key_keeps_path() {
        assert_eq!(
            CacheKey::signed_url("vids/v1.mp4"),
            "v1:signed_url:vids/v1.mp4"
        );
    }

    #[test]
    fn test_entity_type() {
        assert_eq!(CacheKey::entity_type("v1:video:abc"), Some("video"));
        assert_eq!(
            CacheKey::entity_type("v1:signed_url:vids/a:b.mp4"),
            Some("signed_url")
        );
        assert_eq!(CacheKey::entity_type("invalid"), None);
    }
}
