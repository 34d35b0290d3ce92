//! Versioned encoding for values stored in the cache tier
//!
//! Every cached value is wrapped in an envelope `{"v": <version>, "data": <value>}`.
//! Payloads written under a different version, or that do not match the
//! schema of the requested type, are rejected with a typed error rather than
//! defaulted.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current payload schema version
pub const PAYLOAD_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported payload version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    v: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct Header {
    v: u32,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, PayloadError> {
    let bytes = serde_json::to_vec(&EnvelopeRef {
        v: PAYLOAD_VERSION,
        data: value,
    })?;
    Ok(bytes)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PayloadError> {
    let header: Header = serde_json::from_slice(bytes)?;
    if header.v != PAYLOAD_VERSION {
        return Err(PayloadError::UnsupportedVersion {
            found: header.v,
            expected: PAYLOAD_VERSION,
        });
    }
    let envelope: Envelope<T> = serde_json::from_slice(bytes)?;
    Ok(envelope.data)
}
