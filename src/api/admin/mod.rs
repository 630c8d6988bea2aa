//! Admin API endpoints for managing gateway resources

pub mod api_keys;
pub mod cache;
pub mod circuit_breakers;
pub mod events;
pub mod routes;
pub mod services;
pub mod telemetry;

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::state::AppState;

pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        // Route table
        .route("/routes", get(routes::list_routes).post(routes::create_route))
        .route(
            "/routes/{route_id}",
            get(routes::get_route)
                .put(routes::update_route)
                .delete(routes::delete_route),
        )
        .route("/routes/{route_id}/enable", post(routes::enable_route))
        .route("/routes/{route_id}/disable", post(routes::disable_route))
        .route("/routes/{route_id}/deprecate", post(routes::deprecate_route))
        .route("/routes/{route_id}/maintenance", post(routes::maintenance_route))
        // API keys
        .route(
            "/api-keys",
            get(api_keys::list_api_keys).post(api_keys::create_api_key),
        )
        .route("/api-keys/{key_id}", get(api_keys::get_api_key))
        .route("/api-keys/{key_id}/revoke", post(api_keys::revoke_api_key))
        .route("/api-keys/{key_id}/rotate", post(api_keys::rotate_api_key))
        // Circuit breakers
        .route(
            "/circuit-breakers",
            get(circuit_breakers::list_circuit_breakers),
        )
        .route(
            "/circuit-breakers/{route_id}",
            get(circuit_breakers::get_circuit_breaker),
        )
        .route(
            "/circuit-breakers/{route_id}/reset",
            post(circuit_breakers::reset_circuit_breaker),
        )
        // Cache
        .route("/cache", delete(cache::invalidate_cache))
        // Upstream services
        .route(
            "/services",
            get(services::list_services).post(services::register_service),
        )
        .route("/services/{name}", delete(services::unregister_service))
        // Telemetry
        .route("/stats", get(telemetry::get_stats))
        .route("/logs", get(telemetry::get_logs))
        .route("/events", get(events::stream_events))
}
