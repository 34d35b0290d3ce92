//! Video hosting core models and types
//!
//! Shared data structures for video-service and related systems

pub mod constants;
pub mod models;
pub mod payload;
pub mod resolution;

pub use models::*;
pub use payload::{decode, encode, PayloadError, PAYLOAD_VERSION};
pub use resolution::{InvalidResolution, Resolution, ResolutionWhitelist};

/// Resolutions served until the encoding pipeline records per-video renditions.
pub fn default_available_resolutions() -> std::collections::BTreeSet<Resolution> {
    std::collections::BTreeSet::from([Resolution::P720])
}
