//! In-memory API key repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository, ApiKeyStatus};
use crate::domain::DomainError;

/// In-memory implementation of ApiKeyRepository
///
/// Keys are indexed by id and by secret digest; rotation re-points the digest index.
#[derive(Debug, Default)]
pub struct InMemoryApiKeyRepository {
    keys: DashMap<String, ApiKey>,
    hash_index: DashMap<String, String>,
}

impl InMemoryApiKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(id: &ApiKeyId) -> DomainError {
    DomainError::not_found(format!("API key '{}' not found", id))
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeyRepository {
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        Ok(self.keys.get(id.as_str()).map(|k| k.clone()))
    }

    async fn get_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, DomainError> {
        let Some(id) = self.hash_index.get(key_hash).map(|id| id.clone()) else {
            return Ok(None);
        };

        Ok(self.keys.get(&id).map(|k| k.clone()))
    }

    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError> {
        let id = api_key.id().as_str().to_string();

        if self.keys.contains_key(&id) {
            return Err(DomainError::conflict(format!(
                "API key with ID '{}' already exists",
                id
            )));
        }

        self.hash_index
            .insert(api_key.key_hash().to_string(), id.clone());
        self.keys.insert(id, api_key.clone());

        Ok(api_key)
    }

    async fn revoke(&self, id: &ApiKeyId) -> Result<ApiKey, DomainError> {
        let mut key = self.keys.get_mut(id.as_str()).ok_or_else(|| not_found(id))?;
        key.revoke();
        Ok(key.clone())
    }

    async fn rotate_secret(
        &self,
        id: &ApiKeyId,
        key_hash: &str,
        key_prefix: &str,
    ) -> Result<ApiKey, DomainError> {
        // The entry guard is held across the re-index so a concurrent revoke
        // either lands before (and the rotation is refused) or after.
        let mut key = self.keys.get_mut(id.as_str()).ok_or_else(|| not_found(id))?;

        if !key.status().is_usable() {
            return Err(DomainError::conflict(format!(
                "API key '{}' is not active and cannot be rotated",
                id
            )));
        }

        let previous_hash = key.key_hash().to_string();
        key.rotate_secret(key_hash, key_prefix);

        self.hash_index.remove(&previous_hash);
        self.hash_index
            .insert(key_hash.to_string(), id.as_str().to_string());

        Ok(key.clone())
    }

    async fn mark_expired(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        Ok(self.keys.get_mut(id.as_str()).map(|mut key| {
            key.mark_expired();
            key.clone()
        }))
    }

    async fn list(&self) -> Result<Vec<ApiKey>, DomainError> {
        let mut keys: Vec<ApiKey> = self.keys.iter().map(|k| k.value().clone()).collect();
        keys.sort_by_key(|k| k.created_at());
        Ok(keys)
    }

    async fn list_by_organization(
        &self,
        organization_id: &str,
    ) -> Result<Vec<ApiKey>, DomainError> {
        let mut keys: Vec<ApiKey> = self
            .keys
            .iter()
            .filter(|k| k.organization_id() == organization_id)
            .map(|k| k.value().clone())
            .collect();
        keys.sort_by_key(|k| k.created_at());
        Ok(keys)
    }

    async fn count_active(&self) -> Result<usize, DomainError> {
        Ok(self
            .keys
            .iter()
            .filter(|k| k.status() == ApiKeyStatus::Active)
            .count())
    }

    async fn record_usage(
        &self,
        id: &ApiKeyId,
        at: DateTime<Utc>,
    ) -> Result<Option<ApiKey>, DomainError> {
        Ok(self.keys.get_mut(id.as_str()).map(|mut key| {
            key.record_usage(at);
            key.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str, hash: &str, org: &str) -> ApiKey {
        ApiKey::new(
            ApiKeyId::new(id).unwrap(),
            "Test",
            hash,
            "gk_abc",
            org,
            "user-1",
        )
    }

    #[tokio::test]
    async fn test_create_and_lookup_by_hash() {
        let repo = InMemoryApiKeyRepository::new();
        repo.create(key("key_1", "sha256$aa", "org-1")).await.unwrap();

        let found = repo.get_by_hash("sha256$aa").await.unwrap().unwrap();
        assert_eq!(found.id().as_str(), "key_1");
        assert!(repo.get_by_hash("sha256$bb").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_id_fails() {
        let repo = InMemoryApiKeyRepository::new();
        repo.create(key("key_1", "sha256$aa", "org-1")).await.unwrap();

        let result = repo.create(key("key_1", "sha256$bb", "org-1")).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_rotate_secret_reindexes_hash() {
        let repo = InMemoryApiKeyRepository::new();
        repo.create(key("key_1", "sha256$aa", "org-1")).await.unwrap();
        let id = ApiKeyId::new("key_1").unwrap();

        let rotated = repo.rotate_secret(&id, "sha256$bb", "gk_def").await.unwrap();

        assert_eq!(rotated.key_hash(), "sha256$bb");
        assert!(repo.get_by_hash("sha256$aa").await.unwrap().is_none());
        assert!(repo.get_by_hash("sha256$bb").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rotate_secret_refuses_revoked_key() {
        let repo = InMemoryApiKeyRepository::new();
        repo.create(key("key_1", "sha256$aa", "org-1")).await.unwrap();
        let id = ApiKeyId::new("key_1").unwrap();
        repo.revoke(&id).await.unwrap();

        let result = repo.rotate_secret(&id, "sha256$bb", "gk_def").await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        assert!(repo.get_by_hash("sha256$bb").await.unwrap().is_none());
        let stored = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.status(), ApiKeyStatus::Revoked);
    }

    #[tokio::test]
    async fn test_mutations_on_missing_key() {
        let repo = InMemoryApiKeyRepository::new();
        let id = ApiKeyId::new("key_1").unwrap();

        assert!(matches!(repo.revoke(&id).await, Err(DomainError::NotFound { .. })));
        assert!(matches!(
            repo.rotate_secret(&id, "sha256$bb", "gk_def").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(repo.mark_expired(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_expired_keeps_revocation() {
        let repo = InMemoryApiKeyRepository::new();
        repo.create(key("key_1", "sha256$aa", "org-1")).await.unwrap();
        repo.create(key("key_2", "sha256$bb", "org-1")).await.unwrap();
        let active = ApiKeyId::new("key_1").unwrap();
        let revoked = ApiKeyId::new("key_2").unwrap();
        repo.revoke(&revoked).await.unwrap();

        let expired = repo.mark_expired(&active).await.unwrap().unwrap();
        let still_revoked = repo.mark_expired(&revoked).await.unwrap().unwrap();

        assert_eq!(expired.status(), ApiKeyStatus::Expired);
        assert_eq!(still_revoked.status(), ApiKeyStatus::Revoked);
    }

    #[tokio::test]
    async fn test_list_by_organization_and_count_active() {
        let repo = InMemoryApiKeyRepository::new();
        repo.create(key("key_1", "sha256$aa", "org-1")).await.unwrap();
        repo.create(key("key_2", "sha256$bb", "org-2")).await.unwrap();
        repo.create(key("key_3", "sha256$cc", "org-1")).await.unwrap();
        repo.revoke(&ApiKeyId::new("key_3").unwrap()).await.unwrap();

        assert_eq!(repo.list_by_organization("org-1").await.unwrap().len(), 2);
        assert_eq!(repo.list().await.unwrap().len(), 3);
        assert_eq!(repo.count_active().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_record_usage() {
        let repo = InMemoryApiKeyRepository::new();
        repo.create(key("key_1", "sha256$aa", "org-1")).await.unwrap();
        let id = ApiKeyId::new("key_1").unwrap();

        repo.record_usage(&id, Utc::now()).await.unwrap();
        let updated = repo.record_usage(&id, Utc::now()).await.unwrap().unwrap();

        assert_eq!(updated.usage_count(), 2);
        assert!(updated.last_used_at().is_some());
    }
}
