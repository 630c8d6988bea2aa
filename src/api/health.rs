//! Health check endpoints for Kubernetes probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use super::state::AppState;
use crate::api::types::Json;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthCheck {
    fn healthy(name: &str, message: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            status: HealthStatus::Healthy,
            message,
        }
    }
}

/// GET /healthz
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// GET /readyz
///
/// Unhealthy when the route table can't be read; degraded when a registered
/// upstream failed its last call.
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let mut checks = Vec::new();

    let routes_check = match state.routes.list(true).await {
        Ok(routes) => HealthCheck::healthy("route_table", Some(format!("{} routes", routes.len()))),
        Err(e) => HealthCheck {
            name: "route_table".to_string(),
            status: HealthStatus::Unhealthy,
            message: Some(e.to_string()),
        },
    };
    checks.push(routes_check);

    let unhealthy: Vec<String> = state
        .services
        .list_all()
        .into_iter()
        .filter(|s| !s.healthy)
        .map(|s| s.name)
        .collect();
    checks.push(if unhealthy.is_empty() {
        HealthCheck::healthy("upstream_services", None)
    } else {
        HealthCheck {
            name: "upstream_services".to_string(),
            status: HealthStatus::Degraded,
            message: Some(format!("unhealthy: {}", unhealthy.join(", "))),
        }
    });

    let overall_status = overall(&checks);
    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// GET /livez
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

fn overall(checks: &[HealthCheck]) -> HealthStatus {
    if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
        HealthStatus::Unhealthy
    } else if checks.iter().any(|c| c.status == HealthStatus::Degraded) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(serde_json::to_string(&HealthStatus::Healthy).unwrap(), "\"healthy\"");
        assert_eq!(serde_json::to_string(&HealthStatus::Degraded).unwrap(), "\"degraded\"");
    }

    #[test]
    fn test_overall_status() {
        let degraded = HealthCheck {
            name: "upstream_services".to_string(),
            status: HealthStatus::Degraded,
            message: None,
        };
        assert_eq!(overall(&[HealthCheck::healthy("route_table", None)]), HealthStatus::Healthy);
        assert_eq!(
            overall(&[HealthCheck::healthy("route_table", None), degraded]),
            HealthStatus::Degraded
        );
    }
}
