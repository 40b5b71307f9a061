//! # Metrics
//!
//! Prometheus export for `GET /metrics`.
//!
//! **Counters:**
//! - `spendwise_rate_cache_hits_total` / `spendwise_rate_cache_misses_total`
//! - `spendwise_rate_fetches_total{outcome}` - Upstream exchange rate requests
//! - `spendwise_suggestion_cache_hits_total`
//! - `spendwise_ai_attempts_total{model, outcome}` - Model calls by result kind
//! - `spendwise_suggestion_fallbacks_total{reason}` - stale, generic, irrelevant
//!
//! **Histograms:**
//! - `spendwise_ai_request_duration_seconds{model}` - Model call latency
//!
//! **Gauges:**
//! - `spendwise_rate_cache_entries`, `spendwise_suggestion_cache_entries`

pub mod handler;

// Re-export PrometheusBuilder for test compatibility
pub use metrics_exporter_prometheus::PrometheusBuilder;

use crate::advisor::SuggestionCache;
use crate::rates::ExchangeRateCache;
use std::time::Instant;

/// Owns the Prometheus handle and derives gauges on demand.
pub struct MetricsCollector {
    /// Server startup time for uptime calculation
    start_time: Instant,
    prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
}

impl MetricsCollector {
    pub fn new(
        start_time: Instant,
        prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
    ) -> Self {
        Self {
            start_time,
            prometheus_handle,
        }
    }

    pub fn update_cache_gauges(&self, rates: &ExchangeRateCache, suggestions: &SuggestionCache) {
        metrics::gauge!("spendwise_rate_cache_entries").set(rates.len() as f64);
        metrics::gauge!("spendwise_suggestion_cache_entries").set(suggestions.len() as f64);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Render Prometheus metrics in text format.
    pub fn render_metrics(&self) -> String {
        self.prometheus_handle.render()
    }
}

/// Install the global Prometheus recorder.
///
/// Model latency buckets span 0.1s to 2 minutes.
pub fn setup_metrics(
) -> Result<metrics_exporter_prometheus::PrometheusHandle, Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::Matcher;

    let duration_buckets = &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("spendwise_ai_request_duration_seconds".to_string()),
            duration_buckets,
        )?
        .install_recorder()?;

    Ok(handle)
}
