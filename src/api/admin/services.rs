//! Upstream service registry admin endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::upstream::ServiceEntry;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterServiceRequest {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListServicesResponse {
    pub services: Vec<ServiceEntry>,
    pub total: usize,
}

/// GET /admin/services
pub async fn list_services(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Json<ListServicesResponse> {
    let services = state.services.list_all();
    let total = services.len();

    Json(ListServicesResponse { services, total })
}

/// POST /admin/services
pub async fn register_service(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(request): Json<RegisterServiceRequest>,
) -> Result<Response, ApiError> {
    let entry = state.services.register(request.name, request.url)?;

    Ok((StatusCode::CREATED, Json(entry)).into_response())
}

/// DELETE /admin/services/{name}
pub async fn unregister_service(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.services.unregister(&name) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("Service '{}' not registered", name)))
    }
}
