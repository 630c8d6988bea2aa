//! API key management admin endpoints

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRateLimit};
use crate::infrastructure::api_key::{IssueApiKeyRequest, IssuedApiKey};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: String,
    pub organization_id: String,
    pub user_id: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub allowed_routes: Vec<String>,
    #[serde(default)]
    pub allowed_ips: Vec<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rate_limit: Option<ApiKeyRateLimit>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl From<CreateApiKeyRequest> for IssueApiKeyRequest {
    fn from(req: CreateApiKeyRequest) -> Self {
        Self {
            name: req.name,
            organization_id: req.organization_id,
            user_id: req.user_id,
            permissions: req.permissions,
            allowed_routes: req.allowed_routes,
            allowed_ips: req.allowed_ips,
            expires_at: req.expires_at,
            rate_limit: req.rate_limit,
            metadata: req.metadata,
        }
    }
}

/// Key with its secret; returned only on creation and rotation
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyWithSecretResponse {
    #[serde(flatten)]
    pub api_key: ApiKey,
    pub key: String,
}

impl From<IssuedApiKey> for ApiKeyWithSecretResponse {
    fn from(issued: IssuedApiKey) -> Self {
        Self {
            api_key: issued.api_key,
            key: issued.secret,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListApiKeysQuery {
    #[serde(default)]
    pub organization_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListApiKeysResponse {
    pub api_keys: Vec<ApiKey>,
    pub total: usize,
}

fn key_id(id: String) -> Result<ApiKeyId, ApiError> {
    ApiKeyId::new(id).map_err(ApiError::from)
}

/// GET /admin/api-keys
pub async fn list_api_keys(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<ListApiKeysQuery>,
) -> Result<Json<ListApiKeysResponse>, ApiError> {
    debug!(organization_id = ?query.organization_id, "Admin listing API keys");

    let api_keys = match query.organization_id.as_deref() {
        Some(org) => state.api_keys.list_by_organization(org).await?,
        None => state.api_keys.list().await?,
    };
    let total = api_keys.len();

    Ok(Json(ListApiKeysResponse { api_keys, total }))
}

/// POST /admin/api-keys
pub async fn create_api_key(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(request): Json<CreateApiKeyRequest>,
) -> Result<Response, ApiError> {
    debug!(admin = %admin.identifier(), name = %request.name, "Admin creating API key");

    let issued = state.api_keys.issue(request.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiKeyWithSecretResponse::from(issued)),
    )
        .into_response())
}

/// GET /admin/api-keys/{key_id}
pub async fn get_api_key(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiKey>, ApiError> {
    let id = key_id(id)?;

    state
        .api_keys
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("API key '{}' not found", id)))
}

/// POST /admin/api-keys/{key_id}/revoke
pub async fn revoke_api_key(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiKey>, ApiError> {
    let id = key_id(id)?;
    debug!(admin = %admin.identifier(), key_id = %id, "Admin revoking API key");

    Ok(Json(state.api_keys.revoke(&id).await?))
}

/// POST /admin/api-keys/{key_id}/rotate
pub async fn rotate_api_key(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiKeyWithSecretResponse>, ApiError> {
    let id = key_id(id)?;
    debug!(admin = %admin.identifier(), key_id = %id, "Admin rotating API key");

    let issued = state.api_keys.rotate(&id).await?;
    Ok(Json(issued.into()))
}
