//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use uuid::Uuid;

use super::config::MetricsConfig;

const MAX_LABEL_PATH_LEN: usize = 50;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Install the global Prometheus recorder
///
/// Returns `None` when metrics are disabled or a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    let builder = match PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Suffix("duration_seconds".to_string()),
        &config.latency_buckets,
    ) {
        Ok(builder) => builder,
        Err(e) => {
            tracing::warn!("Ignoring configured latency buckets: {}", e);
            PrometheusBuilder::new()
        }
    };

    match builder.install_recorder() {
        Ok(handle) => {
            gauge!("api_gateway_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an inbound HTTP request (control plane and data plane alike)
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Outcome labels for a request that went through the gateway pipeline
pub struct GatewayRequestMetric<'a> {
    pub route_id: &'a str,
    pub method: &'a str,
    pub status: u16,
    pub duration: Duration,
    pub cached: bool,
    pub rate_limited: bool,
}

pub fn record_gateway_request(metric: GatewayRequestMetric<'_>) {
    let labels = [
        ("route", metric.route_id.to_string()),
        ("method", metric.method.to_string()),
        ("status", metric.status.to_string()),
    ];

    counter!("gateway_requests_total", &labels).increment(1);
    histogram!("gateway_request_duration_seconds", &labels)
        .record(metric.duration.as_secs_f64());

    let route = [("route", metric.route_id.to_string())];
    if metric.cached {
        counter!("gateway_cache_hits_total", &route).increment(1);
    }
    if metric.rate_limited {
        counter!("gateway_rate_limited_total", &route).increment(1);
    }
}

/// Record a circuit breaker state change (`state` is the new state)
pub fn record_circuit_transition(route_id: &str, state: &'static str) {
    counter!(
        "gateway_circuit_transitions_total",
        "route" => route_id.to_string(),
        "state" => state
    )
    .increment(1);
}

pub fn record_upstream_failure(service: &str) {
    counter!("gateway_upstream_failures_total", "service" => service.to_string()).increment(1);
}

/// Collapse ids in a URL path so it can be used as a metric label
fn sanitize_path(path: &str) -> String {
    let path = path
        .split('/')
        .map(|segment| {
            let numeric = !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit());
            if numeric || Uuid::parse_str(segment).is_ok() {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    path.chars().take(MAX_LABEL_PATH_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path_uuid() {
        let path = "/api/orders/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(sanitize_path(path), "/api/orders/{id}");
    }

    #[test]
    fn test_sanitize_path_numeric_id() {
        assert_eq!(sanitize_path("/api/users/123/orders"), "/api/users/{id}/orders");
        assert_eq!(sanitize_path("/api/users/123"), "/api/users/{id}");
    }

    #[test]
    fn test_sanitize_path_no_id() {
        assert_eq!(sanitize_path("/health"), "/health");
    }

    #[test]
    fn test_sanitize_path_truncates_long_paths() {
        let path = "/very/long/path/that/exceeds/the/maximum/allowed/length/for/metrics";
        assert_eq!(sanitize_path(path).len(), MAX_LABEL_PATH_LEN);
    }

    #[test]
    fn test_recording_without_recorder_is_a_noop() {
        record_http_request("GET", "/health", 200, Duration::from_millis(3));
        record_gateway_request(GatewayRequestMetric {
            route_id: "route_a",
            method: "GET",
            status: 429,
            duration: Duration::from_millis(1),
            cached: false,
            rate_limited: true,
        });
        record_circuit_transition("route_a", "OPEN");
        record_upstream_failure("core");
    }
}
