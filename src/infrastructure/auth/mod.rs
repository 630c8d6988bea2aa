//! Per-route authentication
//!
//! Applies a route's `auth` policy to an inbound request: API keys are
//! checked against the key authority, bearer tokens against an optional
//! HS256 secret.

mod jwt;

#[cfg(test)]
pub(crate) use jwt::test_support;
pub use jwt::{JwtClaims, JwtVerifier};

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::api_key::ApiKey;
use crate::domain::gateway::{GatewayRequest, PipelineError};
use crate::domain::route::{AuthType, Route};
use crate::infrastructure::api_key::{ApiKeyAuthError, ApiKeyService};

/// Shortest bearer token accepted before any signature check
const MIN_TOKEN_LENGTH: usize = 10;

/// Token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(authorization: Option<&str>) -> Option<&str> {
    authorization
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

pub fn is_basic_auth(authorization: Option<&str>) -> bool {
    authorization.is_some_and(|value| value.starts_with("Basic "))
}

/// Identity established by the auth stage
#[derive(Debug, Clone, Default)]
pub struct AuthOutcome {
    pub api_key: Option<ApiKey>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RouteAuthenticator {
    api_keys: Arc<ApiKeyService>,
    jwt: Option<JwtVerifier>,
}

impl RouteAuthenticator {
    pub fn new(api_keys: Arc<ApiKeyService>) -> Self {
        Self {
            api_keys,
            jwt: None,
        }
    }

    /// Verify JWT signatures with this verifier instead of only checking shape
    pub fn with_jwt_verifier(mut self, verifier: JwtVerifier) -> Self {
        self.jwt = Some(verifier);
        self
    }

    pub async fn authenticate(
        &self,
        request: &GatewayRequest,
        route: &Route,
    ) -> Result<AuthOutcome, PipelineError> {
        let auth = route.auth();
        if !auth.required {
            return Ok(AuthOutcome::default());
        }

        let result = match auth.auth_type {
            AuthType::None => Ok(AuthOutcome::default()),
            AuthType::ApiKey => self.authenticate_api_key(request, route).await,
            AuthType::Jwt => self.authenticate_jwt(request, route),
            AuthType::Basic => {
                if is_basic_auth(request.header("authorization")) {
                    Ok(AuthOutcome::default())
                } else {
                    Err(PipelineError::unauthorized("Basic auth required"))
                }
            }
            AuthType::Oauth2 | AuthType::Hmac => {
                Err(PipelineError::unauthorized("Unsupported auth type"))
            }
        };

        if let Err(err) = &result {
            warn!(
                route_id = %route.id(),
                auth_type = auth.auth_type.as_str(),
                client_ip = %request.client_ip,
                reason = %err,
                "Authentication failed"
            );
        }

        result
    }

    async fn authenticate_api_key(
        &self,
        request: &GatewayRequest,
        route: &Route,
    ) -> Result<AuthOutcome, PipelineError> {
        let secret = request
            .header(&route.auth().api_key_header())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| PipelineError::unauthorized("API key required"))?;

        let api_key = self
            .api_keys
            .authenticate(secret, &request.client_ip, route.id().as_str())
            .await
            .map_err(|err| match err {
                ApiKeyAuthError::Repository(inner) => PipelineError::Internal(inner.to_string()),
                other => PipelineError::unauthorized(other.to_string()),
            })?;

        Ok(AuthOutcome {
            user_id: Some(api_key.user_id().to_string()),
            api_key: Some(api_key),
        })
    }

    fn authenticate_jwt(
        &self,
        request: &GatewayRequest,
        route: &Route,
    ) -> Result<AuthOutcome, PipelineError> {
        let token = bearer_token(request.header("authorization"))
            .ok_or_else(|| PipelineError::unauthorized("JWT token required"))?;

        if token.len() < MIN_TOKEN_LENGTH {
            return Err(PipelineError::unauthorized("Invalid JWT token"));
        }

        let Some(verifier) = &self.jwt else {
            return Ok(AuthOutcome::default());
        };

        let claims = verifier
            .verify(token, route.auth().jwt_issuer.as_deref())
            .map_err(|err| {
                debug!(error = %err, "JWT verification failed");
                PipelineError::unauthorized("Invalid JWT token")
            })?;

        Ok(AuthOutcome {
            api_key: None,
            user_id: claims.sub,
        })
    }
}
