//! Cache error types

use thiserror::Error;

/// Failures of the cache tier itself. A miss is not an error.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid TTL for key {0}: entries must expire")]
    InvalidTtl(String),

    #[error("Coalesced load did not finish: {0}")]
    LoadAborted(String),
}

pub type CacheResult<T> = Result<T, CacheError>;
