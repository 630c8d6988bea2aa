//! API Key repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

use super::entity::{ApiKey, ApiKeyId};
use crate::domain::DomainError;

/// Repository trait for API key storage
#[async_trait]
pub trait ApiKeyRepository: Send + Sync + Debug {
    /// Get an API key by its ID
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError>;

    /// Get an API key by the digest of its secret
    async fn get_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, DomainError>;

    /// Create a new API key
    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError>;

    /// Revoke a key in place; revocation is terminal
    async fn revoke(&self, id: &ApiKeyId) -> Result<ApiKey, DomainError>;

    /// Swap an ACTIVE key's secret digest and re-index it in one step
    ///
    /// Fails with `Conflict` when the key is no longer ACTIVE.
    async fn rotate_secret(
        &self,
        id: &ApiKeyId,
        key_hash: &str,
        key_prefix: &str,
    ) -> Result<ApiKey, DomainError>;

    /// Flag a key EXPIRED if it is still ACTIVE; other states are left alone
    async fn mark_expired(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError>;

    /// List all API keys
    async fn list(&self) -> Result<Vec<ApiKey>, DomainError>;

    /// List the keys owned by an organization
    async fn list_by_organization(&self, organization_id: &str)
    -> Result<Vec<ApiKey>, DomainError>;

    /// Count keys currently in ACTIVE status
    async fn count_active(&self) -> Result<usize, DomainError>;

    /// Atomically bump usage fields, returning the updated key
    async fn record_usage(
        &self,
        id: &ApiKeyId,
        at: DateTime<Utc>,
    ) -> Result<Option<ApiKey>, DomainError>;
}
