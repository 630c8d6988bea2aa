//! Observability configuration
//!
//! Read from the `[observability]` section; every field has a default so an
//! empty section yields Prometheus on `/metrics` and no span export.

use serde::Deserialize;

/// Tracing export and Prometheus settings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObservabilityConfig {
    /// Span export to an OTLP collector
    #[serde(default)]
    pub tracing: TracingConfig,
    /// Prometheus recorder and scrape endpoint
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// OpenTelemetry span export
#[derive(Debug, Clone, Deserialize)]
pub struct TracingConfig {
    /// Export spans over OTLP; log output is unaffected
    #[serde(default)]
    pub enabled: bool,
    /// Collector gRPC endpoint, e.g. http://localhost:4317
    #[serde(default = "default_otlp_endpoint")]
    pub otlp_endpoint: String,
    /// `service.name` resource attribute on exported spans
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Fraction of traces kept, 0.0 to 1.0
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

impl TracingConfig {
    /// Sampling ratio clamped to 0.0..=1.0; NaN keeps every trace
    pub fn effective_sampling_ratio(&self) -> f64 {
        if self.sampling_ratio.is_nan() {
            return 1.0;
        }
        self.sampling_ratio.clamp(0.0, 1.0)
    }
}

/// Prometheus scrape endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Mounted next to the admin API, outside the proxy fallback
    #[serde(default = "default_metrics_path")]
    pub path: String,
    /// Histogram buckets in seconds for every `*_duration_seconds` metric
    #[serde(default = "default_latency_buckets")]
    pub latency_buckets: Vec<f64>,
}

fn default_otlp_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "pmp-api-gateway".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_latency_buckets() -> Vec<f64> {
    vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            otlp_endpoint: default_otlp_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_metrics_path(),
            latency_buckets: default_latency_buckets(),
        }
    }
}
