//! Aggregate statistics over retained request logs

use std::collections::HashMap;

use chrono::Timelike;
use serde::Serialize;

use super::request_log::RequestLog;

const TOP_N: usize = 10;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RouteCount {
    pub route: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorCount {
    pub error: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayStats {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub cached_requests: usize,
    pub rate_limited_requests: usize,
    pub average_latency_ms: f64,
    pub p95_latency_ms: u64,
    pub p99_latency_ms: u64,
    pub requests_by_route: HashMap<String, usize>,
    pub requests_by_method: HashMap<String, usize>,
    pub requests_by_status: HashMap<u16, usize>,
    /// 24 buckets, UTC hour of day
    pub requests_by_hour: Vec<usize>,
    pub active_api_keys: usize,
    pub top_routes: Vec<RouteCount>,
    pub top_errors: Vec<ErrorCount>,
}

impl GatewayStats {
    /// Compute statistics; routes are grouped by request path
    pub fn from_logs<'a>(
        logs: impl IntoIterator<Item = &'a RequestLog>,
        active_api_keys: usize,
    ) -> Self {
        let mut durations = Vec::new();
        let mut successful = 0;
        let mut failed = 0;
        let mut cached = 0;
        let mut rate_limited = 0;
        let mut by_route: HashMap<String, usize> = HashMap::new();
        let mut by_method: HashMap<String, usize> = HashMap::new();
        let mut by_status: HashMap<u16, usize> = HashMap::new();
        let mut by_hour = vec![0usize; 24];
        let mut errors: HashMap<String, usize> = HashMap::new();

        for log in logs {
            durations.push(log.duration_ms);

            if log.is_success() {
                successful += 1;
            }
            if log.is_failure() {
                failed += 1;
            }
            if log.cached {
                cached += 1;
            }
            if log.rate_limited {
                rate_limited += 1;
            }

            *by_route.entry(log.path.clone()).or_default() += 1;
            *by_method.entry(log.method.as_str().to_string()).or_default() += 1;
            *by_status.entry(log.status_code).or_default() += 1;
            by_hour[log.timestamp.hour() as usize] += 1;

            if let Some(error) = &log.error {
                *errors.entry(error.clone()).or_default() += 1;
            }
        }

        durations.sort_unstable();
        let total = durations.len();

        let average_latency_ms = if total == 0 {
            0.0
        } else {
            durations.iter().sum::<u64>() as f64 / total as f64
        };

        let top_routes = top_n(&by_route)
            .into_iter()
            .map(|(route, count)| RouteCount { route, count })
            .collect();
        let top_errors = top_n(&errors)
            .into_iter()
            .map(|(error, count)| ErrorCount { error, count })
            .collect();

        Self {
            total_requests: total,
            successful_requests: successful,
            failed_requests: failed,
            cached_requests: cached,
            rate_limited_requests: rate_limited,
            average_latency_ms,
            p95_latency_ms: percentile(&durations, 0.95),
            p99_latency_ms: percentile(&durations, 0.99),
            requests_by_route: by_route,
            requests_by_method: by_method,
            requests_by_status: by_status,
            requests_by_hour: by_hour,
            active_api_keys,
            top_routes,
            top_errors,
        }
    }
}

/// Nearest-rank percentile over sorted values
fn percentile(sorted: &[u64], ratio: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }

    let index = ((sorted.len() as f64) * ratio).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Highest counts first, ties broken by name for stable output
fn top_n(counts: &HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> =
        counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(TOP_N);
    entries
}
