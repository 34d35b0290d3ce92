use chrono::{DateTime, Utc};
use std::time::Duration;
use video_core::constants::{
    DEFAULT_SIGNED_URL_SAFETY_MARGIN_SECS, DEFAULT_VIDEO_BUCKET, DEFAULT_VIDEO_INFO_TTL_SECS,
    DEFAULT_VIDEO_LOCATION_TTL_SECS, SIGNED_URL_VALIDITY_SECS,
};
use video_core::SignedUrlEntry;

/// Cache and blob-store policy for [`super::VideoRepository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySettings {
    /// Host prefix for thumbnail URLs
    pub thumb_host: String,
    /// Bucket the playback URLs are signed for
    pub video_bucket: String,
    /// Upper bound on how long video metadata stays cached
    pub video_info_ttl: Duration,
    /// Upper bound on how long an (id, resolution) -> file mapping stays cached
    pub video_location_ttl: Duration,
    /// Validity requested from the blob store for each signed URL
    pub signed_url_validity: Duration,
    /// Upper bound on how long a signed URL stays cached
    pub signed_url_cache_ttl: Duration,
    /// A cached signed URL is only served while it outlives this margin
    pub signed_url_safety_margin: Duration,
}

impl RepositorySettings {
    pub fn new(thumb_host: impl Into<String>) -> Self {
        Self {
            thumb_host: thumb_host.into(),
            video_bucket: DEFAULT_VIDEO_BUCKET.to_string(),
            video_info_ttl: Duration::from_secs(DEFAULT_VIDEO_INFO_TTL_SECS),
            video_location_ttl: Duration::from_secs(DEFAULT_VIDEO_LOCATION_TTL_SECS),
            signed_url_validity: Duration::from_secs(SIGNED_URL_VALIDITY_SECS),
            signed_url_cache_ttl: Duration::from_secs(SIGNED_URL_VALIDITY_SECS),
            signed_url_safety_margin: Duration::from_secs(DEFAULT_SIGNED_URL_SAFETY_MARGIN_SECS),
        }
    }

    pub(crate) fn safety_margin(&self) -> chrono::Duration {
        to_chrono(self.signed_url_safety_margin)
    }

    /// Cache TTL for a freshly signed URL: the configured bound, capped so the
    /// entry expires from the cache before the URL itself stops being usable.
    ///
    /// `None` when the URL would not outlive the safety margin at all.
    pub fn signed_url_ttl(&self, entry: &SignedUrlEntry, now: DateTime<Utc>) -> Option<Duration> {
        let usable = entry.remaining(now)? - self.safety_margin();
        let usable = usable.to_std().ok().filter(|d| !d.is_zero())?;
        Some(usable.min(self.signed_url_cache_ttl))
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(duration.as_millis() as i64)
}

pub(crate) fn validity(settings: &RepositorySettings) -> chrono::Duration {
    to_chrono(settings.signed_url_validity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(issued_at: DateTime<Utc>) -> SignedUrlEntry {
        SignedUrlEntry::new(
            "https://blobs/v.mp4?sig=1".to_string(),
            "v.mp4".to_string(),
            issued_at,
            chrono::Duration::hours(24),
        )
    }

    #[test]
    fn test_signed_url_ttl_stays_inside_validity() {
        let settings = RepositorySettings::new("https://thumbs");
        let now = Utc::now();
        let ttl = settings.signed_url_ttl(&entry(now), now).unwrap();
        assert_eq!(ttl, Duration::from_secs(24 * 3600 - 60));
    }

    #[test]
    fn test_signed_url_ttl_honours_configured_bound() {
        let mut settings = RepositorySettings::new("https://thumbs");
        settings.signed_url_cache_ttl = Duration::from_secs(3600);
        let now = Utc::now();
        assert_eq!(
            settings.signed_url_ttl(&entry(now), now),
            Some(Duration::from_secs(3600))
        );
    }

    #[test]
    fn test_signed_url_ttl_none_when_nearly_expired() {
        let settings = RepositorySettings::new("https://thumbs");
        let issued = Utc::now() - chrono::Duration::hours(24) + chrono::Duration::seconds(30);
        assert_eq!(settings.signed_url_ttl(&entry(issued), Utc::now()), None);
        let issued = Utc::now() - chrono::Duration::hours(25);
        assert_eq!(settings.signed_url_ttl(&entry(issued), Utc::now()), None);
    }
}
