//! Admin authentication
//!
//! Allows either:
//! - the configured admin token as `Authorization: Bearer <token>`
//! - an active API key carrying the `admin` permission, in `X-API-Key`
//!   or as a bearer token, presented from an address the key allows

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use chrono::Utc;
use tracing::{debug, warn};

use crate::api::proxy::client_ip;
use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::api_key::ApiKey;
use crate::domain::route::DEFAULT_API_KEY_HEADER;
use crate::infrastructure::api_key::constant_time_compare;
use crate::infrastructure::auth::bearer_token;

#[derive(Debug, Clone)]
pub enum AdminAuth {
    Token,
    ApiKey(ApiKey),
}

impl AdminAuth {
    pub fn identifier(&self) -> String {
        match self {
            AdminAuth::Token => "admin_token".to_string(),
            AdminAuth::ApiKey(key) => format!("api_key:{}", key.id()),
        }
    }
}

/// Extractor that rejects requests without admin credentials
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AdminAuth);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = bearer_token(
            parts
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok()),
        );

        if let (Some(token), Some(admin_token)) = (bearer, state.admin_token.as_deref()) {
            if constant_time_compare(token, admin_token) {
                debug!("Admin access via admin token");
                return Ok(RequireAdmin(AdminAuth::Token));
            }
        }

        let secret = parts
            .headers
            .get(DEFAULT_API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .or(bearer)
            .ok_or_else(|| {
                ApiError::unauthorized(
                    "Admin access required. Provide the admin token or an API key with admin permission",
                )
            })?;

        let api_key = state
            .api_keys
            .find_by_value(secret)
            .await?
            .filter(|key| key.is_valid_at(Utc::now()))
            .ok_or_else(|| ApiError::unauthorized("Invalid API key"))?;

        if !api_key.is_admin() {
            warn!(api_key_id = %api_key.id(), "Non-admin API key used on admin API");
            return Err(ApiError::forbidden("Admin access required"));
        }

        let connect_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        let ip = client_ip(&parts.headers, connect_ip);
        if !api_key.allows_ip(&ip) {
            warn!(api_key_id = %api_key.id(), ip = %ip, "Admin API key used from disallowed IP");
            return Err(ApiError::forbidden("API key not allowed from this address"));
        }

        debug!(api_key_id = %api_key.id(), "Admin access via API key");
        Ok(RequireAdmin(AdminAuth::ApiKey(api_key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::domain::api_key::{ApiKeyId, ADMIN_PERMISSION};
    use crate::infrastructure::api_key::IssueApiKeyRequest;
    use axum::http::{Request, StatusCode};

    async fn state_with_admin_key(allowed_ips: Vec<String>) -> (AppState, String) {
        let state = crate::create_app_state(&AppConfig::default()).await.unwrap();
        let issued = state
            .api_keys
            .issue(IssueApiKeyRequest {
                name: "ops".to_string(),
                organization_id: "org".to_string(),
                user_id: "user".to_string(),
                permissions: vec![ADMIN_PERMISSION.to_string()],
                allowed_ips,
                ..Default::default()
            })
            .await
            .unwrap();
        (state, issued.secret)
    }

    async fn extract(
        state: &AppState,
        secret: &str,
        forwarded_for: &str,
    ) -> Result<RequireAdmin, ApiError> {
        let (mut parts, _) = Request::builder()
            .uri("/admin/routes")
            .header(DEFAULT_API_KEY_HEADER, secret)
            .header("x-forwarded-for", forwarded_for)
            .body(())
            .unwrap()
            .into_parts();
        RequireAdmin::from_request_parts(&mut parts, state).await
    }

    #[tokio::test]
    async fn test_admin_key_rejected_outside_allowed_ips() {
        let (state, secret) = state_with_admin_key(vec!["10.0.0.1".to_string()]).await;

        let err = extract(&state, &secret, "203.0.113.9").await.unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let RequireAdmin(auth) = extract(&state, &secret, "10.0.0.1").await.unwrap();
        assert!(matches!(auth, AdminAuth::ApiKey(_)));
    }

    #[tokio::test]
    async fn test_admin_key_without_ip_restriction() {
        let (state, secret) = state_with_admin_key(Vec::new()).await;

        assert!(extract(&state, &secret, "203.0.113.9").await.is_ok());
    }

    #[test]
    fn test_admin_auth_identifier() {
        let api_key = ApiKey::new(ApiKeyId::generate(), "ops", "hash", "gk_abc", "org", "user");

        assert!(AdminAuth::ApiKey(api_key).identifier().starts_with("api_key:"));
        assert_eq!(AdminAuth::Token.identifier(), "admin_token");
    }
}
