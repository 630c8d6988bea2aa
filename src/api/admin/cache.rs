//! Response cache admin endpoint

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateQuery {
    /// Substring of the cache key; all entries when absent
    #[serde(default)]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub invalidated: usize,
}

/// DELETE /admin/cache
pub async fn invalidate_cache(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<InvalidateQuery>,
) -> Result<Json<InvalidateResponse>, ApiError> {
    let invalidated = state.cache.invalidate(query.pattern.as_deref()).await?;

    info!(
        admin = %admin.identifier(),
        pattern = ?query.pattern,
        invalidated,
        "Cache invalidated"
    );

    Ok(Json(InvalidateResponse { invalidated }))
}
