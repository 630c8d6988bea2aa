use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::route::HttpMethod;

/// Route id recorded for requests that matched no route
pub const UNMATCHED_ROUTE: &str = "unknown";

/// Immutable record of one handled request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLog {
    pub id: String,
    pub request_id: String,
    pub route_id: String,
    pub method: HttpMethod,
    pub path: String,
    pub status_code: u16,
    pub duration_ms: u64,
    pub client_ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub cached: bool,
    pub rate_limited: bool,
    pub timestamp: DateTime<Utc>,
}

impl RequestLog {
    pub fn generate_id() -> String {
        format!("log_{}", uuid::Uuid::new_v4().simple())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_failure(&self) -> bool {
        self.status_code >= 400
    }
}
