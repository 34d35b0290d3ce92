//! Logging and distributed tracing setup
//!
//! Installs a `tracing` subscriber with an env-filter and a text or JSON log
//! layer. When enabled, spans are also exported over OTLP so that the span
//! tree built by the request path (handler -> repository -> cache / store /
//! blob store) shows up in Jaeger, Tempo or any OTLP backend.

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    runtime,
    trace::{RandomIdGenerator, Sampler, Tracer},
    Resource,
};
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod config;

pub use config::TracingConfig;

#[derive(Error, Debug)]
pub enum TracingError {
    #[error("failed to install OTLP exporter: {0}")]
    Exporter(#[from] opentelemetry::trace::TraceError),

    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
}

/// Default filter: `info` everywhere, `debug` for the service crate itself.
fn default_filter(service_name: &str) -> EnvFilter {
    let crate_name = service_name.replace('-', "_");
    EnvFilter::try_new(format!("info,{crate_name}=debug")).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging and, if configured, OTLP span export for a service.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing(service_name: &str, config: &TracingConfig) -> Result<(), TracingError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(service_name));

    let telemetry_layer = if config.enabled {
        global::set_text_map_propagator(TraceContextPropagator::new());
        let tracer = init_otlp_tracer(service_name, config)?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    let json_layer = config
        .json_logs
        .then(|| fmt::layer().json().with_current_span(true));
    let text_layer = (!config.json_logs).then(|| fmt::layer().with_target(true).with_level(true));

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| TracingError::Subscriber(e.to_string()))?;

    tracing::info!(
        service = service_name,
        otlp = config.enabled,
        sample_rate = config.sample_rate,
        "Tracing initialized"
    );

    Ok(())
}

fn init_otlp_tracer(service_name: &str, config: &TracingConfig) -> Result<Tracer, TracingError> {
    let resource = Resource::new(vec![
        KeyValue::new("service.name", service_name.to_string()),
        KeyValue::new("service.version", config.service_version.clone()),
        KeyValue::new("deployment.environment", config.environment.clone()),
    ]);

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(config.otlp_endpoint.clone());

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(
            opentelemetry_sdk::trace::config()
                .with_sampler(Sampler::TraceIdRatioBased(config.sample_rate))
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource),
        )
        .install_batch(runtime::Tokio)?;

    Ok(tracer)
}

/// Flush pending spans. Call before the process exits.
pub fn shutdown_tracing() {
    global::shutdown_tracer_provider();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_targets_service_crate() {
        let filter = default_filter("video-service");
        assert!(filter.to_string().contains("video_service=debug"));
    }
}
