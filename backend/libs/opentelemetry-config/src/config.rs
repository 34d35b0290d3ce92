//! Tracing configuration structures

use serde::{Deserialize, Serialize};

/// Logging and distributed tracing settings for a service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Export spans over OTLP (log output is always on)
    pub enabled: bool,

    /// OTLP collector endpoint, e.g. "http://jaeger:4317"
    pub otlp_endpoint: String,

    /// Sample rate (0.0 to 1.0)
    pub sample_rate: f64,

    /// Service version reported as a resource attribute
    pub service_version: String,

    /// Deployment environment (development, staging, production)
    pub environment: String,

    /// Emit log lines as JSON instead of human-readable text
    pub json_logs: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            otlp_endpoint: "http://localhost:4317".to_string(),
            sample_rate: 1.0,
            service_version: "dev".to_string(),
            environment: "development".to_string(),
            json_logs: false,
        }
    }
}

impl TracingConfig {
    /// Create configuration from environment variables
    ///
    /// - `TRACING_ENABLED`: export spans (true/false)
    /// - `OTLP_ENDPOINT`: OTLP collector endpoint
    /// - `TRACING_SAMPLE_RATE`: sample rate, clamped to 0.0-1.0
    /// - `SERVICE_VERSION`: service version
    /// - `APP_ENV`: environment; `production` switches logs to JSON
    /// - `LOG_FORMAT`: `json` or `text`, overrides the environment default
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`TracingConfig::from_env`], reading through `lookup`
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let enabled = lookup("TRACING_ENABLED")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.enabled);

        let otlp_endpoint = lookup("OTLP_ENDPOINT").unwrap_or(defaults.otlp_endpoint);

        let sample_rate = lookup("TRACING_SAMPLE_RATE")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(defaults.sample_rate)
            .clamp(0.0, 1.0);

        let service_version = lookup("SERVICE_VERSION").unwrap_or(defaults.service_version);

        let environment = lookup("APP_ENV").unwrap_or(defaults.environment);

        let json_logs = match lookup("LOG_FORMAT").as_deref() {
            Some("json") => true,
            Some("text") => false,
            _ => environment == "production",
        };

        Self {
            enabled,
            otlp_endpoint,
            sample_rate,
            service_version,
            environment,
            json_logs,
        }
    }
}
