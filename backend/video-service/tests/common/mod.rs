//! Hand-written collaborators for the repository and handler tests
#![allow(dead_code)]

use async_trait::async_trait;
use s3_utils::{BlobStore, BlobStoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use video_cache::{CacheError, CacheLookup, CacheOperations, CacheResult, InMemoryCache};
use video_core::{Resolution, VideoRecord};
use video_service::db::{MetadataStore, StoreError};
use video_service::{RepositorySettings, VideoRepository};

pub const THUMB_HOST: &str = "https://thumbs.example.com";

pub fn record(title: &str, file_path: &str) -> VideoRecord {
    VideoRecord {
        title: title.to_string(),
        description: format!("{title} description"),
        date_created: "2018-03-01 10:00:00+00".to_string(),
        views: 0,
        likes: 0,
        dislikes: 0,
        file_path: file_path.to_string(),
    }
}

#[derive(Default)]
struct StoreState {
    videos: HashMap<String, VideoRecord>,
    video_calls: usize,
    file_path_calls: usize,
    fail: bool,
}

/// Metadata store backed by a map, counting every call.
#[derive(Clone, Default)]
pub struct MockMetadataStore {
    state: Arc<Mutex<StoreState>>,
    delay: Option<Duration>,
}

impl MockMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video(self, id: &str, record: VideoRecord) -> Self {
        self.state.lock().unwrap().videos.insert(id.to_string(), record);
        self
    }

    /// Hold every call for `delay` so concurrent callers overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(self) -> Self {
        self.state.lock().unwrap().fail = true;
        self
    }

    pub fn video_calls(&self) -> usize {
        self.state.lock().unwrap().video_calls
    }

    pub fn file_path_calls(&self) -> usize {
        self.state.lock().unwrap().file_path_calls
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn lookup(&self, id: &str) -> Result<VideoRecord, StoreError> {
        let state = self.state.lock().unwrap();
        if state.fail {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        state
            .videos
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl MetadataStore for MockMetadataStore {
    async fn fetch_video(&self, id: &str) -> Result<VideoRecord, StoreError> {
        self.state.lock().unwrap().video_calls += 1;
        self.pause().await;
        self.lookup(id)
    }

    async fn fetch_file_path(&self, id: &str, _resolution: Resolution) -> Result<String, StoreError> {
        self.state.lock().unwrap().file_path_calls += 1;
        self.pause().await;
        self.lookup(id).map(|record| record.file_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignCall {
    pub bucket: String,
    pub key: String,
    pub ttl: Duration,
}

/// Blob store minting deterministic URLs and recording each request.
#[derive(Clone, Default)]
pub struct MockBlobStore {
    calls: Arc<Mutex<Vec<SignCall>>>,
    fail: bool,
    first_call_delay: Option<Duration>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Hold only the first signing request for `delay`.
    pub fn with_first_call_delay(mut self, delay: Duration) -> Self {
        self.first_call_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<SignCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn sign_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String, BlobStoreError> {
        let sequence = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(SignCall {
                bucket: bucket.to_string(),
                key: key.to_string(),
                ttl,
            });
            calls.len()
        };
        if let (1, Some(delay)) = (sequence, self.first_call_delay) {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(BlobStoreError::Presign("signing service unavailable".to_string()));
        }
        Ok(format!(
            "https://blobs.example.com/{bucket}/{key}?X-Amz-Expires={}&sig={sequence}",
            ttl.as_secs()
        ))
    }
}

/// Cache whose backend is always down.
#[derive(Clone, Default)]
pub struct FailingCache {
    calls: Arc<Mutex<usize>>,
}

impl FailingCache {
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl CacheOperations for FailingCache {
    async fn get(&self, _key: &str) -> CacheResult<CacheLookup> {
        *self.calls.lock().unwrap() += 1;
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> CacheResult<()> {
        *self.calls.lock().unwrap() += 1;
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn ping(&self) -> CacheResult<()> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}

/// Cache that answers reads but rejects writes.
#[derive(Clone, Default)]
pub struct ReadOnlyCache;

#[async_trait]
impl CacheOperations for ReadOnlyCache {
    async fn get(&self, _key: &str) -> CacheResult<CacheLookup> {
        Ok(CacheLookup::Miss)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::Unavailable("read-only replica".to_string()))
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}

/// In-memory cache whose first write stalls for `delay` and then fails.
#[derive(Clone)]
pub struct StallingCache {
    inner: InMemoryCache,
    stalled: Arc<Mutex<bool>>,
    delay: Duration,
}

impl StallingCache {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryCache::new(),
            stalled: Arc::new(Mutex::new(false)),
            delay,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }
}

#[async_trait]
impl CacheOperations for StallingCache {
    async fn get(&self, key: &str) -> CacheResult<CacheLookup> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let first = !std::mem::replace(&mut *self.stalled.lock().unwrap(), true);
        if first {
            tokio::time::sleep(self.delay).await;
            return Err(CacheError::Unavailable("write timed out".to_string()));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}

pub struct Harness {
    pub cache: Arc<InMemoryCache>,
    pub store: MockMetadataStore,
    pub blobs: MockBlobStore,
    pub repo: Arc<VideoRepository>,
}

pub fn settings() -> RepositorySettings {
    RepositorySettings::new(THUMB_HOST)
}

pub fn harness(store: MockMetadataStore, blobs: MockBlobStore) -> Harness {
    let cache = Arc::new(InMemoryCache::new());
    let repo = Arc::new(VideoRepository::new(
        cache.clone(),
        Arc::new(store.clone()),
        Arc::new(blobs.clone()),
        settings(),
    ));
    Harness {
        cache,
        store,
        blobs,
        repo,
    }
}

/// Store with the two videos used across scenarios.
pub fn seeded_store() -> MockMetadataStore {
    MockMetadataStore::new()
        .with_video("v1", record("Cats", "vids/v1.mp4"))
        .with_video("v2", record("Dogs", "vids/v2.mp4"))
}
