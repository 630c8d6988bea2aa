//! Request statistics and log endpoints

use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::telemetry::{GatewayStats, RequestLog};

const DEFAULT_LOG_LIMIT: usize = 100;
const MAX_LOG_LIMIT: usize = 1000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<RequestLog>,
    pub limit: usize,
    pub offset: usize,
    pub retained: usize,
}

/// GET /admin/stats
pub async fn get_stats(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<StatsQuery>,
) -> Result<Json<GatewayStats>, ApiError> {
    let active_api_keys = state.api_keys.count_active().await?;

    Ok(Json(
        state.request_logs.stats(query.since, active_api_keys).await,
    ))
}

/// GET /admin/logs
pub async fn get_logs(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<LogsQuery>,
) -> Json<LogsResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).min(MAX_LOG_LIMIT);
    let offset = query.offset.unwrap_or(0);

    Json(LogsResponse {
        logs: state.request_logs.recent(limit, offset).await,
        limit,
        offset,
        retained: state.request_logs.len().await,
    })
}
