//! Circuit breaker admin endpoints

use axum::extract::{Path, State};
use serde::Serialize;
use tracing::info;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::circuit_breaker::CircuitBreaker;
use crate::domain::route::RouteId;

#[derive(Debug, Clone, Serialize)]
pub struct ListCircuitBreakersResponse {
    pub circuit_breakers: Vec<CircuitBreaker>,
    pub total: usize,
}

/// GET /admin/circuit-breakers
pub async fn list_circuit_breakers(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Json<ListCircuitBreakersResponse> {
    let circuit_breakers = state.circuit_breakers.list();
    let total = circuit_breakers.len();

    Json(ListCircuitBreakersResponse {
        circuit_breakers,
        total,
    })
}

/// GET /admin/circuit-breakers/{route_id}
pub async fn get_circuit_breaker(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(route_id): Path<String>,
) -> Result<Json<CircuitBreaker>, ApiError> {
    let route_id = RouteId::new(route_id)?;

    state
        .circuit_breakers
        .get(&route_id)
        .map(Json)
        .ok_or_else(|| {
            ApiError::not_found(format!("Circuit breaker for route '{}' not found", route_id))
        })
}

/// POST /admin/circuit-breakers/{route_id}/reset
pub async fn reset_circuit_breaker(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(route_id): Path<String>,
) -> Result<Json<CircuitBreaker>, ApiError> {
    let route_id = RouteId::new(route_id)?;
    info!(admin = %admin.identifier(), route_id = %route_id, "Admin resetting circuit breaker");

    Ok(Json(state.circuit_breakers.reset(&route_id)?))
}
