//! Cache tier for the video hosting service
//!
//! Provides:
//! - A byte-oriented cache contract that tells a miss apart from a backend failure
//! - Redis and in-memory backends
//! - Versioned key schema
//! - Request coalescing for concurrent misses on the same key
//! - Metrics integration

mod error;
mod keys;
mod memory;
mod metrics;
mod redis_cache;
mod singleflight;

pub use error::{CacheError, CacheResult};
pub use keys::{CacheKey, CACHE_VERSION};
pub use memory::InMemoryCache;
pub use metrics::CacheMetrics;
pub use redis_cache::RedisVideoCache;
pub use singleflight::SingleFlight;

use std::time::Duration;

/// Outcome of a cache probe that reached the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(Vec<u8>),
    Miss,
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }
}

/// Core cache operations trait
///
/// `get` returns `Ok(CacheLookup::Miss)` for an absent or expired key and
/// `Err` only when the backend itself failed.
#[async_trait::async_trait]
pub trait CacheOperations: Send + Sync {
    /// Get raw bytes for a key
    async fn get(&self, key: &str) -> CacheResult<CacheLookup>;

    /// Store raw bytes under a key for at most `ttl`
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    /// Check backend connectivity
    async fn ping(&self) -> CacheResult<()>;
}

/// TTL helpers
pub mod ttl {
    use std::time::Duration;

    /// Shave up to 10% off a TTL so entries written together do not expire together.
    ///
    /// The result never exceeds `ttl` and never drops to zero.
    pub fn with_jitter(ttl: Duration) -> Duration {
        let millis = ttl.as_millis() as u64;
        let max_jitter = millis / 10;
        if max_jitter == 0 {
            return ttl;
        }
        let jitter = rand::random::<u64>() % (max_jitter + 1);
        Duration::from_millis((millis - jitter).max(1))
    }
}

pub(crate) fn validate_ttl(key: &str, ttl: Duration) -> CacheResult<()> {
    if ttl.is_zero() {
        return Err(CacheError::InvalidTtl(key.to_string()));
    }
    Ok(())
}
