/// S3 configuration for the video blob store
use serde::{Deserialize, Serialize};

const DEFAULT_PRESIGNED_URL_EXPIRY_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// Bucket holding video files
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Custom endpoint, e.g. a MinIO deployment
    pub endpoint: Option<String>,
    /// Whether to use path-style URLs (false = virtual-hosted-style)
    pub path_style: bool,
    /// Validity of presigned playback URLs in seconds
    pub presigned_url_expiry_secs: u64,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: "videos".to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
            path_style: false,
            presigned_url_expiry_secs: DEFAULT_PRESIGNED_URL_EXPIRY_SECS,
        }
    }
}

impl S3Config {
    /// Load S3 configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load S3 configuration through an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            bucket: lookup("S3_VIDEO_BUCKET").unwrap_or(defaults.bucket),
            region: lookup("S3_REGION").unwrap_or(defaults.region),
            endpoint: lookup("S3_ENDPOINT").filter(|v| !v.is_empty()),
            path_style: lookup("S3_PATH_STYLE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.path_style),
            presigned_url_expiry_secs: lookup("S3_PRESIGNED_URL_EXPIRY_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.presigned_url_expiry_secs),
        }
    }

    pub fn presigned_url_expiry(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.presigned_url_expiry_secs)
    }
}
