//! Redis-backed cache

use crate::{validate_ttl, CacheError, CacheLookup, CacheMetrics, CacheOperations, CacheResult};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Redis cache client.
///
/// `ConnectionManager` multiplexes one reconnecting connection; each call
/// works on a cheap clone of it so concurrent requests do not queue on a lock.
#[derive(Clone)]
pub struct RedisVideoCache {
    conn: ConnectionManager,
    metrics: CacheMetrics,
}

impl RedisVideoCache {
    /// Connect to the Redis instance at `redis_url`.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        info!("Redis cache connected");
        Ok(Self::with_manager(conn))
    }

    pub fn with_manager(conn: ConnectionManager) -> Self {
        Self {
            conn,
            metrics: CacheMetrics::new(),
        }
    }
}

#[async_trait::async_trait]
impl CacheOperations for RedisVideoCache {
    async fn get(&self, key: &str) -> CacheResult<CacheLookup> {
        let mut conn = self.conn.clone();

        match conn.get::<_, Option<Vec<u8>>>(key).await {
            Ok(Some(data)) => {
                debug!(key = %key, "Cache hit");
                self.metrics.record_hit(key);
                Ok(CacheLookup::Hit(data))
            }
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                self.metrics.record_miss(key);
                Ok(CacheLookup::Miss)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Redis get error");
                self.metrics.record_error(key, "redis");
                Err(CacheError::Redis(e))
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        validate_ttl(key, ttl)?;
        let ttl_ms = ttl.as_millis() as u64;

        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| {
                warn!(key = %key, error = %e, "Redis set error");
                self.metrics.record_error(key, "redis");
                CacheError::Redis(e)
            })?;

        debug!(key = %key, ttl_ms, "Cache set");
        self.metrics.record_write(key);
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Unavailable(format!(
                "unexpected PING response: {pong}"
            )))
        }
    }
}
