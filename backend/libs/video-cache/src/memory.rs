//! Process-local cache backend
//!
//! Used for local development without Redis and as the cache double in tests.
//! Expiry follows tokio's clock, so paused-time tests can step past a TTL.

use crate::{validate_ttl, CacheLookup, CacheMetrics, CacheOperations, CacheResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

#[derive(Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    metrics: CacheMetrics,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining lifetime of a live entry.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.expires_at - now)
    }

    /// Whether a live entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.ttl(key).is_some()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        entries.values().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl CacheOperations for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<CacheLookup> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(entry) = entries.get(key) {
            if entry.expires_at > Instant::now() {
                debug!(key = %key, "Cache hit");
                self.metrics.record_hit(key);
                return Ok(CacheLookup::Hit(entry.value.clone()));
            }
            entries.remove(key);
        }

        debug!(key = %key, "Cache miss");
        self.metrics.record_miss(key);
        Ok(CacheLookup::Miss)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        validate_ttl(key, ttl)?;

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );

        debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "Cache set");
        self.metrics.record_write(key);
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}
