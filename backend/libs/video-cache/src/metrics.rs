//! Cache metrics for observability

use crate::keys::CacheKey;
use prometheus::{CounterVec, Opts, Registry};
use std::sync::OnceLock;

static METRICS: OnceLock<CacheMetricsInner> = OnceLock::new();

struct CacheMetricsInner {
    hits: CounterVec,
    misses: CounterVec,
    writes: CounterVec,
    errors: CounterVec,
    coalesced: CounterVec,
}

fn counter(name: &str, help: &str, labels: &[&str]) -> CounterVec {
    CounterVec::new(Opts::new(name, help), labels).expect("static metric definition is valid")
}

impl CacheMetricsInner {
    fn new() -> Self {
        Self {
            hits: counter("vidhost_cache_hits_total", "Cache probes answered from the cache", &["entity"]),
            misses: counter("vidhost_cache_misses_total", "Cache probes that found no live entry", &["entity"]),
            writes: counter("vidhost_cache_writes_total", "Entries written after a source load", &["entity"]),
            errors: counter(
                "vidhost_cache_errors_total",
                "Cache backend failures, never counted as misses",
                &["entity", "error_type"],
            ),
            coalesced: counter(
                "vidhost_cache_coalesced_loads_total",
                "Cache misses served by an in-flight load of the same key",
                &["entity"],
            ),
        }
    }

    fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.hits.clone()))?;
        registry.register(Box::new(self.misses.clone()))?;
        registry.register(Box::new(self.writes.clone()))?;
        registry.register(Box::new(self.errors.clone()))?;
        registry.register(Box::new(self.coalesced.clone()))?;
        Ok(())
    }
}

fn get_metrics() -> &'static CacheMetricsInner {
    METRICS.get_or_init(CacheMetricsInner::new)
}

fn extract_entity(key: &str) -> &str {
    CacheKey::entity_type(key).unwrap_or("unknown")
}

/// Cache metrics wrapper
#[derive(Clone, Default)]
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn new() -> Self {
        Self
    }

    /// Register metrics with a Prometheus registry
    pub fn register(registry: &Registry) -> Result<(), prometheus::Error> {
        get_metrics().register(registry)
    }

    pub fn record_hit(&self, key: &str) {
        let entity = extract_entity(key);
        get_metrics().hits.with_label_values(&[entity]).inc();
    }

    pub fn record_miss(&self, key: &str) {
        let entity = extract_entity(key);
        get_metrics().misses.with_label_values(&[entity]).inc();
    }

    pub fn record_write(&self, key: &str) {
        let entity = extract_entity(key);
        get_metrics().writes.with_label_values(&[entity]).inc();
    }

    pub fn record_error(&self, key: &str, error_type: &str) {
        let entity = extract_entity(key);
        get_metrics()
            .errors
            .with_label_values(&[entity, error_type])
            .inc();
    }

    pub fn record_coalesced(&self, key: &str) {
        let entity = extract_entity(key);
        get_metrics().coalesced.with_label_values(&[entity]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_labelled_by_entity() {
        let metrics = CacheMetrics::new();
        // Label owned by this test alone; the counters are process-global.
        let before = get_metrics().hits.with_label_values(&["labelled_hits"]).get();
        metrics.record_hit("v1:labelled_hits:abc");
        let after = get_metrics().hits.with_label_values(&["labelled_hits"]).get();
        assert_eq!(after - before, 1.0);
    }

    #[test]
    fn test_register_exposes_families() {
        let registry = Registry::new();
        CacheMetrics::register(&registry).unwrap();
        CacheMetrics::new().record_miss("v1:signed_url:vids/v1.mp4");
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"vidhost_cache_misses_total".to_string()));
    }
}
