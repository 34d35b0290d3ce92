//! Cache-aside data access for video metadata and playback URLs
//!
//! Every lookup probes the cache first. A miss loads from the source of truth
//! (metadata store or blob store), writes the result back and returns it. A
//! cache *error* is never treated as a miss: it fails the operation.
//!
//! Concurrent misses on one key are coalesced so the source sees a single
//! load per key at a time.
//!
//! Each operation runs in a span that is a child of the caller's span, and
//! each step (cache probe, store query, signing, cache write) opens its own
//! child span. Spans close when dropped, so they close on error paths too.

mod settings;

pub use settings::RepositorySettings;

use chrono::Utc;
use s3_utils::BlobStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, debug_span, error, field, info, info_span, warn, Instrument, Span};
use video_cache::{ttl, CacheKey, CacheLookup, CacheMetrics, CacheOperations, SingleFlight};
use video_core::{
    decode, default_available_resolutions, encode, Resolution, SignedUrlEntry, VideoLocation,
    VideoMetadata, VideoRecord,
};

use crate::db::MetadataStore;
use crate::error::RepositoryError;

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Long-lived collaborators, shared with in-flight loads.
struct Backends {
    cache: Arc<dyn CacheOperations>,
    store: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    settings: RepositorySettings,
    metrics: CacheMetrics,
}

pub struct VideoRepository {
    backends: Arc<Backends>,
    info_loads: SingleFlight<VideoMetadata, RepositoryError>,
    location_loads: SingleFlight<String, RepositoryError>,
    url_loads: SingleFlight<SignedUrlEntry, RepositoryError>,
}

impl VideoRepository {
    pub fn new(
        cache: Arc<dyn CacheOperations>,
        store: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        settings: RepositorySettings,
    ) -> Self {
        Self {
            backends: Arc::new(Backends {
                cache,
                store,
                blobs,
                settings,
                metrics: CacheMetrics::new(),
            }),
            info_loads: SingleFlight::new(),
            location_loads: SingleFlight::new(),
            url_loads: SingleFlight::new(),
        }
    }

    /// Descriptive record for `id`.
    pub async fn get_video_info(&self, parent: &Span, id: &str) -> RepositoryResult<VideoMetadata> {
        let span = info_span!(parent: parent, "get_video_info_repo", video.id = %id, cache.hit = field::Empty);
        let key = CacheKey::video(id);

        async {
            let metadata = match self.backends.probe(&span, &key).await? {
                CacheLookup::Hit(bytes) => {
                    span.record("cache.hit", true);
                    decode_cached::<VideoMetadata>(&key, &bytes)?
                }
                CacheLookup::Miss => {
                    span.record("cache.hit", false);
                    let backends = self.backends.clone();
                    let (load_span, owned_id, owned_key) = (span.clone(), id.to_string(), key.clone());
                    let flight = self
                        .info_loads
                        .run(&key, move || async move {
                            backends.load_video_info(&load_span, &owned_id, &owned_key).await
                        })
                        .await;
                    self.backends.note_flight(&key, flight.shared);
                    flight.result?
                }
            };

            info!(
                title = %metadata.title,
                description = %metadata.description,
                date_created = %metadata.date_created,
                views = metadata.views,
                likes = metadata.likes,
                dislikes = metadata.dislikes,
                thumbnail_url = %metadata.thumbnail_url,
                "video info resolved"
            );
            Ok::<_, RepositoryError>(metadata)
        }
        .instrument(span.clone())
        .await
    }

    /// Signed playback URL for `id` at `resolution`.
    ///
    /// The resolution is assumed to be whitelisted by the caller.
    pub async fn get_video_url(
        &self,
        parent: &Span,
        id: &str,
        resolution: Resolution,
    ) -> RepositoryResult<String> {
        let span = info_span!(
            parent: parent,
            "get_video_url_repo",
            video.id = %id,
            video.resolution = %resolution,
            file_path = field::Empty
        );

        async {
            let file_path = self.resolve_file_path(&span, id, resolution).await?;
            span.record("file_path", file_path.as_str());

            let entry = self.resolve_signed_url(&span, &file_path).await?;
            debug!(expires_at = %entry.expires_at, "playback url resolved");
            Ok::<_, RepositoryError>(entry.url)
        }
        .instrument(span.clone())
        .await
    }

    async fn resolve_file_path(
        &self,
        parent: &Span,
        id: &str,
        resolution: Resolution,
    ) -> RepositoryResult<String> {
        let key = CacheKey::video_location(id, resolution.as_str());

        match self.backends.probe(parent, &key).await? {
            CacheLookup::Hit(bytes) => {
                let location = decode_cached::<VideoLocation>(&key, &bytes)?;
                Ok(location.file_path)
            }
            CacheLookup::Miss => {
                let backends = self.backends.clone();
                let (load_span, owned_id, owned_key) = (parent.clone(), id.to_string(), key.clone());
                let flight = self
                    .location_loads
                    .run(&key, move || async move {
                        backends
                            .load_video_location(&load_span, &owned_id, resolution, &owned_key)
                            .await
                    })
                    .await;
                self.backends.note_flight(&key, flight.shared);
                flight.result
            }
        }
    }

    async fn resolve_signed_url(&self, parent: &Span, file_path: &str) -> RepositoryResult<SignedUrlEntry> {
        let key = CacheKey::signed_url(file_path);

        if let CacheLookup::Hit(bytes) = self.backends.probe(parent, &key).await? {
            let entry = decode_cached::<SignedUrlEntry>(&key, &bytes)?;
            if entry.is_usable(Utc::now(), self.backends.settings.safety_margin()) {
                return Ok(entry);
            }
            // Entry outlived its URL (clock skew or a TTL written by another writer).
            warn!(key = %key, expires_at = %entry.expires_at, "cached signed url expired, re-signing");
        }

        let backends = self.backends.clone();
        let (load_span, owned_path, owned_key) = (parent.clone(), file_path.to_string(), key.clone());
        let flight = self
            .url_loads
            .run(&key, move || async move {
                backends.load_signed_url(&load_span, &owned_path, &owned_key).await
            })
            .await;
        self.backends.note_flight(&key, flight.shared);
        let entry = flight.result?;

        // A waiter may resume long after the shared load signed its URL.
        if entry.is_usable(Utc::now(), self.backends.settings.safety_margin()) {
            return Ok(entry);
        }
        warn!(key = %key, expires_at = %entry.expires_at, "coalesced signed url already stale, re-signing");
        self.backends.load_signed_url(parent, file_path, &key).await
    }
}

impl Backends {
    async fn probe(&self, parent: &Span, key: &str) -> RepositoryResult<CacheLookup> {
        let span = debug_span!(parent: parent, "cache_get", cache.key = %key);
        self.cache.get(key).instrument(span).await.map_err(|e| {
            error!(key = %key, error = %e, "cache error");
            RepositoryError::from(e)
        })
    }

    async fn populate(&self, parent: &Span, key: &str, value: Vec<u8>, ttl: Duration) -> RepositoryResult<()> {
        let span = debug_span!(parent: parent, "cache_set", cache.key = %key, cache.ttl_ms = ttl.as_millis() as u64);
        self.cache.set(key, value, ttl).instrument(span).await.map_err(|e| {
            error!(key = %key, error = %e, "cache write failed");
            RepositoryError::from(e)
        })
    }

    fn note_flight(&self, key: &str, shared: bool) {
        if shared {
            debug!(key = %key, "joined in-flight load");
            self.metrics.record_coalesced(key);
        }
    }

    async fn fetch_video(&self, parent: &Span, id: &str) -> RepositoryResult<VideoRecord> {
        let span = info_span!(parent: parent, "pg_get_video_info", video.id = %id);
        self.store.fetch_video(id).instrument(span).await.map_err(|e| {
            warn!(video_id = %id, error = %e, "metadata lookup failed");
            RepositoryError::from(e)
        })
    }

    async fn load_video_info(&self, parent: &Span, id: &str, key: &str) -> RepositoryResult<VideoMetadata> {
        let record = self.fetch_video(parent, id).await?;

        let metadata = VideoMetadata::from_record(
            id,
            record,
            &self.settings.thumb_host,
            default_available_resolutions(),
        );

        let bytes = encode(&metadata)?;
        self.populate(parent, key, bytes, ttl::with_jitter(self.settings.video_info_ttl))
            .await?;
        Ok(metadata)
    }

    async fn load_video_location(
        &self,
        parent: &Span,
        id: &str,
        resolution: Resolution,
        key: &str,
    ) -> RepositoryResult<String> {
        let span = info_span!(parent: parent, "pg_get_video_location", video.id = %id, video.resolution = %resolution);
        let file_path = self
            .store
            .fetch_file_path(id, resolution)
            .instrument(span)
            .await
            .map_err(|e| {
                warn!(video_id = %id, error = %e, "file path lookup failed");
                RepositoryError::from(e)
            })?;

        let location = VideoLocation {
            id: id.to_string(),
            resolution,
            file_path,
        };
        let bytes = encode(&location)?;
        self.populate(parent, key, bytes, ttl::with_jitter(self.settings.video_location_ttl))
            .await?;
        Ok(location.file_path)
    }

    async fn load_signed_url(&self, parent: &Span, file_path: &str, key: &str) -> RepositoryResult<SignedUrlEntry> {
        let bucket = &self.settings.video_bucket;
        let validity = self.settings.signed_url_validity;

        // Taken before signing so the recorded window never outlasts the real one.
        let issued_at = Utc::now();
        let span = info_span!(parent: parent, "s3_sign_url", bucket = %bucket, file_path = %file_path);
        let url = self
            .blobs
            .sign_url(bucket, file_path, validity)
            .instrument(span)
            .await
            .map_err(|e| {
                error!(bucket = %bucket, file_path = %file_path, error = %e, "failed to sign playback url");
                RepositoryError::from(e)
            })?;

        let entry = SignedUrlEntry::new(
            url,
            file_path.to_string(),
            issued_at,
            settings::validity(&self.settings),
        );

        match self.settings.signed_url_ttl(&entry, Utc::now()) {
            Some(cache_ttl) => {
                let bytes = encode(&entry)?;
                self.populate(parent, key, bytes, cache_ttl).await?;
            }
            None => warn!(key = %key, "signed url validity shorter than safety margin, not caching"),
        }
        Ok(entry)
    }
}

fn decode_cached<T: serde::de::DeserializeOwned>(key: &str, bytes: &[u8]) -> RepositoryResult<T> {
    decode(bytes).map_err(|e| {
        error!(key = %key, error = %e, "corrupt cache payload");
        RepositoryError::from(e)
    })
}
