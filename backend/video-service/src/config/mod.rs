use opentelemetry_config::TracingConfig;
use s3_utils::{S3Config, MAX_PRESIGN_EXPIRY};
use std::time::Duration;
use thiserror::Error;
use video_core::constants::{
    DEFAULT_SIGNED_URL_SAFETY_MARGIN_SECS, DEFAULT_VIDEO_INFO_TTL_SECS,
    DEFAULT_VIDEO_LOCATION_TTL_SECS, SIGNED_URL_VALIDITY_SECS,
};
use video_core::{InvalidResolution, ResolutionWhitelist};

use crate::repository::RepositorySettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("VALID_RESOLUTIONS: {0}")]
    Resolutions(#[from] InvalidResolution),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub s3: S3Config,
    pub thumb_host: String,
    pub resolutions: ResolutionWhitelist,
    pub tracing: TracingConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis_url: String,
    pub video_info_ttl: Duration,
    pub video_location_ttl: Duration,
    pub signed_url_ttl: Duration,
    pub signed_url_safety_margin: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build the configuration through `lookup`, so tests need not touch the
    /// process environment.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("CACHE_BACKEND").as_deref() {
            None | Some("redis") => CacheBackend::Redis,
            Some("memory") => CacheBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "CACHE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let resolutions = match lookup("VALID_RESOLUTIONS") {
            Some(raw) => ResolutionWhitelist::parse(&raw)?,
            None => ResolutionWhitelist::default(),
        };
        if resolutions.is_empty() {
            return Err(ConfigError::Invalid {
                name: "VALID_RESOLUTIONS",
                value: String::new(),
            });
        }

        let config = Config {
            app: AppConfig {
                env: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
                port: parse_or(&lookup, "APP_PORT", 8000)?,
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            },
            cache: CacheConfig {
                backend,
                redis_url: lookup("REDIS_URL")
                    .unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
                video_info_ttl: secs(&lookup, "VIDEO_INFO_CACHE_TTL_SECS", DEFAULT_VIDEO_INFO_TTL_SECS)?,
                video_location_ttl: secs(
                    &lookup,
                    "VIDEO_LOCATION_CACHE_TTL_SECS",
                    DEFAULT_VIDEO_LOCATION_TTL_SECS,
                )?,
                signed_url_ttl: secs(&lookup, "SIGNED_URL_CACHE_TTL_SECS", SIGNED_URL_VALIDITY_SECS)?,
                signed_url_safety_margin: Duration::from_secs(parse_or(
                    &lookup,
                    "SIGNED_URL_SAFETY_MARGIN_SECS",
                    DEFAULT_SIGNED_URL_SAFETY_MARGIN_SECS,
                )?),
            },
            s3: S3Config::from_vars(&lookup),
            thumb_host: lookup("THUMB_HOST")
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing("THUMB_HOST"))?,
            resolutions,
            tracing: TracingConfig::from_vars(&lookup),
        };

        let expiry = config.s3.presigned_url_expiry();
        if expiry.is_zero() || expiry > MAX_PRESIGN_EXPIRY {
            return Err(ConfigError::Invalid {
                name: "S3_PRESIGNED_URL_EXPIRY_SECS",
                value: config.s3.presigned_url_expiry_secs.to_string(),
            });
        }
        if config.cache.signed_url_safety_margin >= config.s3.presigned_url_expiry() {
            return Err(ConfigError::Invalid {
                name: "SIGNED_URL_SAFETY_MARGIN_SECS",
                value: config.cache.signed_url_safety_margin.as_secs().to_string(),
            });
        }

        Ok(config)
    }

    pub fn repository_settings(&self) -> RepositorySettings {
        RepositorySettings {
            thumb_host: self.thumb_host.clone(),
            video_bucket: self.s3.bucket.clone(),
            video_info_ttl: self.cache.video_info_ttl,
            video_location_ttl: self.cache.video_location_ttl,
            signed_url_validity: self.s3.presigned_url_expiry(),
            signed_url_cache_ttl: self.cache.signed_url_ttl,
            signed_url_safety_margin: self.cache.signed_url_safety_margin,
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}

/// A TTL in whole seconds; zero is rejected.
fn secs<F>(lookup: &F, name: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, name, default)? {
        0 => Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
        }),
        value => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use video_core::Resolution;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|name| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/vidhost"),
        ("THUMB_HOST", "https://thumbs.example.com"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&REQUIRED).unwrap();
        assert_eq!(config.app.port, 8000);
        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.cache.video_info_ttl, Duration::from_secs(300));
        assert_eq!(config.s3.bucket, "videos");
        assert_eq!(config.resolutions.iter().count(), 6);

        let settings = config.repository_settings();
        assert_eq!(settings.signed_url_validity, Duration::from_secs(86_400));
        assert_eq!(settings.signed_url_safety_margin, Duration::from_secs(60));
    }

    #[test]
    fn test_required_values() {
        assert!(matches!(
            load(&[REQUIRED[1]]),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
        assert!(matches!(
            load(&[REQUIRED[0]]),
            Err(ConfigError::Missing("THUMB_HOST"))
        ));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("VIDEO_INFO_CACHE_TTL_SECS", "0"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid {
                name: "VIDEO_INFO_CACHE_TTL_SECS",
                ..
            })
        ));
    }

    #[test]
    fn test_margin_must_be_below_validity() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("S3_PRESIGNED_URL_EXPIRY_SECS", "60"));
        vars.push(("SIGNED_URL_SAFETY_MARGIN_SECS", "60"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid {
                name: "SIGNED_URL_SAFETY_MARGIN_SECS",
                ..
            })
        ));
    }

    #[test]
    fn test_presign_expiry_capped_at_a_week() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("S3_PRESIGNED_URL_EXPIRY_SECS", "604801"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid {
                name: "S3_PRESIGNED_URL_EXPIRY_SECS",
                ..
            })
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("S3_PRESIGNED_URL_EXPIRY_SECS", "604800"));
        let config = load(&vars).unwrap();
        assert_eq!(config.s3.presigned_url_expiry(), MAX_PRESIGN_EXPIRY);
    }

    #[test]
    fn test_resolution_subset() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("VALID_RESOLUTIONS", "480p, 720p"));
        vars.push(("CACHE_BACKEND", "memory"));
        let config = load(&vars).unwrap();
        assert!(config.resolutions.contains(Resolution::P720));
        assert!(!config.resolutions.contains(Resolution::P1080));
        assert_eq!(config.cache.backend, CacheBackend::Memory);

        let mut vars = REQUIRED.to_vec();
        vars.push(("VALID_RESOLUTIONS", "720p,4k"));
        assert!(matches!(load(&vars), Err(ConfigError::Resolutions(_))));
    }

    #[test]
    fn test_unknown_cache_backend() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("CACHE_BACKEND", "memcached"));
        assert!(load(&vars).is_err());
    }
}
