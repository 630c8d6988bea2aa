//! Route table admin endpoints

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::route::{
    AuthConfig, CacheConfig, CircuitBreakerSettings, HttpMethod, RateLimitConfig, Route, RouteId,
    RouteStatus, RouteUpdate, TransformConfig, ValidationConfig,
};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRouteRequest {
    pub name: String,
    pub path: String,
    pub methods: Vec<HttpMethod>,
    pub target_service: String,
    #[serde(default)]
    pub target_path: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub status: Option<RouteStatus>,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
    #[serde(default)]
    pub cache: Option<CacheConfig>,
    #[serde(default)]
    pub validation: Option<ValidationConfig>,
    #[serde(default)]
    pub transform: Option<TransformConfig>,
    /// Falls back to the gateway-wide breaker defaults
    #[serde(default)]
    pub circuit_breaker: Option<CircuitBreakerSettings>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl CreateRouteRequest {
    fn into_route(self, default_breaker: CircuitBreakerSettings) -> Route {
        let mut route = Route::new(
            RouteId::generate(),
            self.name,
            self.path,
            self.methods,
            self.target_service,
        )
        .with_auth(self.auth.unwrap_or_default())
        .with_rate_limit(self.rate_limit.unwrap_or_default())
        .with_cache(self.cache.unwrap_or_default())
        .with_validation(self.validation.unwrap_or_default())
        .with_transform(self.transform.unwrap_or_default())
        .with_circuit_breaker(self.circuit_breaker.unwrap_or(default_breaker))
        .with_tags(self.tags)
        .with_metadata(self.metadata);

        if let Some(description) = self.description {
            route = route.with_description(description);
        }
        if let Some(version) = self.version {
            route = route.with_version(version);
        }
        if let Some(target_path) = self.target_path {
            route = route.with_target_path(target_path);
        }
        if let Some(status) = self.status {
            route = route.with_status(status);
        }

        route
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRoutesQuery {
    #[serde(default)]
    pub include_disabled: bool,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListRoutesResponse {
    pub routes: Vec<Route>,
    pub total: usize,
}

fn route_id(id: String) -> Result<RouteId, ApiError> {
    RouteId::new(id).map_err(ApiError::from)
}

/// GET /admin/routes
pub async fn list_routes(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<ListRoutesQuery>,
) -> Result<Json<ListRoutesResponse>, ApiError> {
    debug!(tag = ?query.tag, include_disabled = query.include_disabled, "Admin listing routes");

    let routes = match query.tag.as_deref() {
        Some(tag) => state.routes.list_by_tag(tag).await?,
        None => state.routes.list(query.include_disabled).await?,
    };
    let total = routes.len();

    Ok(Json(ListRoutesResponse { routes, total }))
}

/// POST /admin/routes
pub async fn create_route(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(request): Json<CreateRouteRequest>,
) -> Result<Response, ApiError> {
    debug!(admin = %admin.identifier(), path = %request.path, "Admin creating route");

    let route = request.into_route(state.routes.default_circuit_breaker());
    let created = state.routes.register(route).await?;

    Ok((StatusCode::CREATED, Json(created)).into_response())
}

/// GET /admin/routes/{route_id}
pub async fn get_route(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Route>, ApiError> {
    let id = route_id(id)?;

    state
        .routes
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Route '{}' not found", id)))
}

/// PUT /admin/routes/{route_id}
pub async fn update_route(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Json(update): Json<RouteUpdate>,
) -> Result<Json<Route>, ApiError> {
    let id = route_id(id)?;
    debug!(admin = %admin.identifier(), route_id = %id, "Admin updating route");

    Ok(Json(state.routes.update(&id, update).await?))
}

/// DELETE /admin/routes/{route_id}
pub async fn delete_route(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = route_id(id)?;
    debug!(admin = %admin.identifier(), route_id = %id, "Admin deleting route");

    state.routes.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/routes/{route_id}/enable
pub async fn enable_route(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Route>, ApiError> {
    Ok(Json(state.routes.enable(&route_id(id)?).await?))
}

/// POST /admin/routes/{route_id}/disable
pub async fn disable_route(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Route>, ApiError> {
    Ok(Json(state.routes.disable(&route_id(id)?).await?))
}

/// POST /admin/routes/{route_id}/deprecate
pub async fn deprecate_route(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Route>, ApiError> {
    Ok(Json(state.routes.deprecate(&route_id(id)?).await?))
}

/// POST /admin/routes/{route_id}/maintenance
pub async fn maintenance_route(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Route>, ApiError> {
    Ok(Json(state.routes.maintenance(&route_id(id)?).await?))
}
