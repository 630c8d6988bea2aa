//! Response cache trait

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::key::CacheKey;
use crate::domain::DomainError;

/// An upstream response held in the cache
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

/// TTL-keyed store for idempotent GET responses
///
/// An entry is never returned once its TTL has elapsed.
#[async_trait]
pub trait ResponseCache: Send + Sync + Debug {
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedResponse>, DomainError>;

    async fn set(
        &self,
        key: &CacheKey,
        response: CachedResponse,
        ttl: Duration,
    ) -> Result<(), DomainError>;

    /// Remove every entry (`None`) or those whose key contains `pattern`;
    /// returns the number of entries removed
    async fn invalidate(&self, pattern: Option<&str>) -> Result<usize, DomainError>;

    async fn len(&self) -> Result<usize, DomainError>;
}
