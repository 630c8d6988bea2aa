//! API Key service - issuance, rotation, revocation and authentication

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::generator::{constant_time_compare, hash_key, ApiKeyGenerator};
use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRateLimit, ApiKeyRepository};
use crate::domain::events::{EventPublisher, GatewayEvent};
use crate::domain::route::validate_duration_ms;
use crate::domain::DomainError;

/// Options for a newly issued key
#[derive(Debug, Clone, Default)]
pub struct IssueApiKeyRequest {
    pub name: String,
    pub organization_id: String,
    pub user_id: String,
    pub permissions: Vec<String>,
    pub allowed_routes: Vec<String>,
    pub allowed_ips: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub rate_limit: Option<ApiKeyRateLimit>,
    pub metadata: HashMap<String, Value>,
}

/// A key together with its secret, which is never retrievable again
#[derive(Debug, Clone)]
pub struct IssuedApiKey {
    pub api_key: ApiKey,
    pub secret: String,
}

/// Why a presented key was refused
#[derive(Debug, Error)]
pub enum ApiKeyAuthError {
    #[error("Invalid API key")]
    Invalid,

    #[error("API key is not active")]
    NotActive,

    #[error("API key has expired")]
    Expired,

    #[error("IP not allowed")]
    IpNotAllowed,

    #[error("API key not allowed for this route")]
    RouteNotAllowed,

    #[error(transparent)]
    Repository(#[from] DomainError),
}

#[derive(Debug)]
pub struct ApiKeyService {
    repository: Arc<dyn ApiKeyRepository>,
    generator: ApiKeyGenerator,
    events: Arc<dyn EventPublisher>,
}

impl ApiKeyService {
    pub fn new(repository: Arc<dyn ApiKeyRepository>, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            repository,
            generator: ApiKeyGenerator::default(),
            events,
        }
    }

    pub fn with_generator(mut self, generator: ApiKeyGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub async fn issue(&self, request: IssueApiKeyRequest) -> Result<IssuedApiKey, DomainError> {
        if request.name.trim().is_empty() {
            return Err(DomainError::validation("API key name is required"));
        }
        if let Some(limit) = &request.rate_limit {
            if limit.requests == 0 || limit.window_ms == 0 {
                return Err(DomainError::validation(
                    "API key rate limit requires positive requests and window_ms",
                ));
            }
            validate_duration_ms("API key rate limit window", limit.window_ms)?;
        }

        let id = ApiKeyId::generate();
        info!(
            "Issuing API key: id={}, name={}, organization={}",
            id, request.name, request.organization_id
        );

        let generated = self.generator.generate();

        let mut api_key = ApiKey::new(
            id,
            request.name,
            generated.hash,
            generated.prefix,
            request.organization_id,
            request.user_id,
        )
        .with_permissions(request.permissions)
        .with_allowed_routes(request.allowed_routes)
        .with_allowed_ips(request.allowed_ips)
        .with_metadata(request.metadata);

        if let Some(expires_at) = request.expires_at {
            api_key = api_key.with_expiration(expires_at);
        }
        if let Some(rate_limit) = request.rate_limit {
            api_key = api_key.with_rate_limit(rate_limit);
        }

        let created = self.repository.create(api_key).await?;

        self.events.publish(GatewayEvent::ApiKeyCreated {
            key_id: created.id().to_string(),
            organization_id: created.organization_id().to_string(),
        });

        Ok(IssuedApiKey {
            api_key: created,
            secret: generated.key,
        })
    }

    pub async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        self.repository.get(id).await
    }

    pub async fn list(&self) -> Result<Vec<ApiKey>, DomainError> {
        self.repository.list().await
    }

    pub async fn list_by_organization(
        &self,
        organization_id: &str,
    ) -> Result<Vec<ApiKey>, DomainError> {
        self.repository.list_by_organization(organization_id).await
    }

    pub async fn count_active(&self) -> Result<usize, DomainError> {
        self.repository.count_active().await
    }

    pub async fn revoke(&self, id: &ApiKeyId) -> Result<ApiKey, DomainError> {
        info!("Revoking API key: id={}", id);

        let updated = self.repository.revoke(id).await?;

        self.events.publish(GatewayEvent::ApiKeyRevoked {
            key_id: id.to_string(),
        });

        Ok(updated)
    }

    /// Replace an active key's secret; the previous secret stops resolving immediately
    pub async fn rotate(&self, id: &ApiKeyId) -> Result<IssuedApiKey, DomainError> {
        info!("Rotating API key: id={}", id);

        let generated = self.generator.generate();
        let updated = self
            .repository
            .rotate_secret(id, &generated.hash, &generated.prefix)
            .await?;

        self.events.publish(GatewayEvent::ApiKeyRotated {
            key_id: id.to_string(),
        });

        Ok(IssuedApiKey {
            api_key: updated,
            secret: generated.key,
        })
    }

    /// Resolve a presented secret to its key, whatever the key's status
    pub async fn find_by_value(&self, secret: &str) -> Result<Option<ApiKey>, DomainError> {
        let digest = hash_key(secret);

        Ok(self
            .repository
            .get_by_hash(&digest)
            .await?
            .filter(|key| constant_time_compare(key.key_hash(), &digest)))
    }

    /// Authenticate a secret for a request from `ip` to `route_id`
    ///
    /// On success the key's usage counters are bumped.
    pub async fn authenticate(
        &self,
        secret: &str,
        ip: &str,
        route_id: &str,
    ) -> Result<ApiKey, ApiKeyAuthError> {
        self.authenticate_at(secret, ip, route_id, Utc::now()).await
    }

    pub async fn authenticate_at(
        &self,
        secret: &str,
        ip: &str,
        route_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ApiKey, ApiKeyAuthError> {
        let api_key = self
            .find_by_value(secret)
            .await?
            .ok_or(ApiKeyAuthError::Invalid)?;

        if !api_key.status().is_usable() {
            warn!(key_id = %api_key.id(), status = ?api_key.status(), "Inactive API key presented");
            return Err(ApiKeyAuthError::NotActive);
        }

        if api_key.is_expired_at(now) {
            warn!(key_id = %api_key.id(), "Expired API key presented");
            self.repository.mark_expired(api_key.id()).await?;
            return Err(ApiKeyAuthError::Expired);
        }

        if !api_key.allows_ip(ip) {
            warn!(key_id = %api_key.id(), ip = %ip, "API key used from disallowed IP");
            return Err(ApiKeyAuthError::IpNotAllowed);
        }

        if !api_key.allows_route(route_id) {
            warn!(key_id = %api_key.id(), route_id = %route_id, "API key used on disallowed route");
            return Err(ApiKeyAuthError::RouteNotAllowed);
        }

        let used = self
            .repository
            .record_usage(api_key.id(), now)
            .await?
            .unwrap_or(api_key);

        // Revoked between the lookup and the usage bump
        if !used.status().is_usable() {
            return Err(ApiKeyAuthError::NotActive);
        }

        debug!(key_id = %used.id(), usage_count = used.usage_count(), "API key authenticated");
        Ok(used)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::domain::api_key::ApiKeyStatus;
    use crate::infrastructure::api_key::InMemoryApiKeyRepository;
    use crate::infrastructure::events::BroadcastEventPublisher;

    fn create_service() -> (ApiKeyService, BroadcastEventPublisher) {
        let events = BroadcastEventPublisher::default();
        let service = ApiKeyService::new(
            Arc::new(InMemoryApiKeyRepository::new()),
            Arc::new(events.clone()),
        );
        (service, events)
    }

    fn request(name: &str) -> IssueApiKeyRequest {
        IssueApiKeyRequest {
            name: name.to_string(),
            organization_id: "org-1".to_string(),
            user_id: "user-1".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_issue_api_key() {
        let (service, events) = create_service();
        let mut receiver = events.subscribe();

        let issued = service.issue(request("Test Key")).await.unwrap();

        assert!(issued.secret.starts_with("gk_"));
        assert_eq!(issued.api_key.status(), ApiKeyStatus::Active);
        assert_eq!(issued.api_key.usage_count(), 0);
        assert!(issued.api_key.id().as_str().starts_with("key_"));
        assert_eq!(receiver.recv().await.unwrap().event.name(), "apikey.created");
    }

    #[tokio::test]
    async fn test_issue_requires_name() {
        let (service, _events) = create_service();
        let result = service.issue(request("  ")).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_issue_rejects_unbounded_rate_limit_window() {
        let (service, _events) = create_service();
        let mut req = request("Override");
        req.rate_limit = Some(ApiKeyRateLimit {
            requests: 10,
            window_ms: u64::MAX,
            strategy: Default::default(),
        });

        let result = service.issue(req).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_authenticate_bumps_usage() {
        let (service, _events) = create_service();
        let issued = service.issue(request("Test Key")).await.unwrap();

        service
            .authenticate(&issued.secret, "10.0.0.1", "route_a")
            .await
            .unwrap();
        let key = service
            .authenticate(&issued.secret, "10.0.0.1", "route_a")
            .await
            .unwrap();

        assert_eq!(key.usage_count(), 2);
        assert!(key.last_used_at().is_some());
    }

    #[tokio::test]
    async fn test_authenticate_unknown_secret() {
        let (service, _events) = create_service();
        let result = service.authenticate("gk_nope", "10.0.0.1", "route_a").await;
        assert!(matches!(result, Err(ApiKeyAuthError::Invalid)));
    }

    #[tokio::test]
    async fn test_revoked_key_always_fails() {
        let (service, _events) = create_service();
        let issued = service.issue(request("Test Key")).await.unwrap();

        let revoked = service.revoke(issued.api_key.id()).await.unwrap();
        assert_eq!(revoked.status(), ApiKeyStatus::Revoked);

        for _ in 0..3 {
            let result = service.authenticate(&issued.secret, "10.0.0.1", "r").await;
            assert!(matches!(result, Err(ApiKeyAuthError::NotActive)));
        }
    }

    #[tokio::test]
    async fn test_rotate_invalidates_old_secret() {
        let (service, _events) = create_service();
        let issued = service.issue(request("Test Key")).await.unwrap();
        service
            .authenticate(&issued.secret, "10.0.0.1", "r")
            .await
            .unwrap();

        let rotated = service.rotate(issued.api_key.id()).await.unwrap();

        assert_ne!(rotated.secret, issued.secret);
        assert_eq!(rotated.api_key.id(), issued.api_key.id());
        assert_eq!(rotated.api_key.usage_count(), 1);
        assert!(service.find_by_value(&issued.secret).await.unwrap().is_none());
        assert!(service.find_by_value(&rotated.secret).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rotate_revoked_key_fails() {
        let (service, _events) = create_service();
        let issued = service.issue(request("Test Key")).await.unwrap();
        service.revoke(issued.api_key.id()).await.unwrap();

        let result = service.rotate(issued.api_key.id()).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        let stored = service.get(issued.api_key.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), ApiKeyStatus::Revoked);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_rotate_and_revoke_never_reactivates() {
        let (service, _events) = create_service();
        let service = Arc::new(service);

        for _ in 0..200 {
            let issued = service.issue(request("Contended")).await.unwrap();
            let id = issued.api_key.id().clone();

            let rotate = {
                let service = service.clone();
                let id = id.clone();
                tokio::spawn(async move { service.rotate(&id).await })
            };
            let revoke = {
                let service = service.clone();
                let id = id.clone();
                tokio::spawn(async move { service.revoke(&id).await })
            };

            let rotated = rotate.await.unwrap();
            revoke.await.unwrap().unwrap();

            let stored = service.get(&id).await.unwrap().unwrap();
            assert_eq!(stored.status(), ApiKeyStatus::Revoked);

            if let Ok(rotated) = rotated {
                let result = service.authenticate(&rotated.secret, "10.0.0.1", "r").await;
                assert!(matches!(result, Err(ApiKeyAuthError::NotActive)));
            }
            let result = service.authenticate(&issued.secret, "10.0.0.1", "r").await;
            assert!(result.is_err());
        }
    }

    #[tokio::test]
    async fn test_expired_key_is_flagged_lazily() {
        let (service, _events) = create_service();
        let mut req = request("Short lived");
        req.expires_at = Some(Utc::now() + Duration::minutes(5));
        let issued = service.issue(req).await.unwrap();

        let later = Utc::now() + Duration::minutes(10);
        let result = service
            .authenticate_at(&issued.secret, "10.0.0.1", "r", later)
            .await;
        assert!(matches!(result, Err(ApiKeyAuthError::Expired)));

        let stored = service.get(issued.api_key.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), ApiKeyStatus::Expired);

        let result = service.authenticate(&issued.secret, "10.0.0.1", "r").await;
        assert!(matches!(result, Err(ApiKeyAuthError::NotActive)));
    }

    #[tokio::test]
    async fn test_allowed_ips_and_routes() {
        let (service, _events) = create_service();
        let mut req = request("Restricted");
        req.allowed_ips = vec!["10.0.0.1".to_string()];
        req.allowed_routes = vec!["route_a".to_string()];
        let issued = service.issue(req).await.unwrap();

        assert!(matches!(
            service.authenticate(&issued.secret, "10.0.0.2", "route_a").await,
            Err(ApiKeyAuthError::IpNotAllowed)
        ));
        assert!(matches!(
            service.authenticate(&issued.secret, "10.0.0.1", "route_b").await,
            Err(ApiKeyAuthError::RouteNotAllowed)
        ));
        assert!(service
            .authenticate(&issued.secret, "10.0.0.1", "route_a")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_revoke_missing_key() {
        let (service, _events) = create_service();
        let result = service.revoke(&ApiKeyId::new("key_missing").unwrap()).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_by_organization_and_count() {
        let (service, _events) = create_service();
        service.issue(request("A")).await.unwrap();
        let b = service.issue(request("B")).await.unwrap();
        let mut other = request("C");
        other.organization_id = "org-2".to_string();
        service.issue(other).await.unwrap();

        service.revoke(b.api_key.id()).await.unwrap();

        assert_eq!(service.list_by_organization("org-1").await.unwrap().len(), 2);
        assert_eq!(service.list().await.unwrap().len(), 3);
        assert_eq!(service.count_active().await.unwrap(), 2);
    }
}
