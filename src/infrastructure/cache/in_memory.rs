//! In-memory response cache using moka

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::{future::Cache as MokaCache, Expiry};
use tracing::debug;

use crate::domain::cache::{CacheKey, CachedResponse, ResponseCache};
use crate::domain::DomainError;

/// Upper bound on any entry's lifetime
const MAX_ENTRY_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    response: CachedResponse,
    ttl: Duration,
    /// Expiration timestamp (millis since epoch)
    expires_at: u64,
}

/// Gives every entry its own time-to-live
struct PerEntryTtl;

impl Expiry<String, CacheEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Response cache bounded by entry count
///
/// moka evicts expired entries in the background; reads also check
/// `expires_at` so a stale entry is never served between evictions.
#[derive(Debug)]
pub struct InMemoryResponseCache {
    cache: MokaCache<String, CacheEntry>,
}

impl InMemoryResponseCache {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: MokaCache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    fn current_time_millis() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn is_expired(entry: &CacheEntry) -> bool {
        Self::current_time_millis() >= entry.expires_at
    }
}

impl Default for InMemoryResponseCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl ResponseCache for InMemoryResponseCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedResponse>, DomainError> {
        match self.cache.get(key.as_str()).await {
            Some(entry) if Self::is_expired(&entry) => {
                self.cache.remove(key.as_str()).await;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.response)),
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &CacheKey,
        response: CachedResponse,
        ttl: Duration,
    ) -> Result<(), DomainError> {
        let ttl = ttl.min(MAX_ENTRY_TTL);
        let entry = CacheEntry {
            response,
            ttl,
            expires_at: Self::current_time_millis()
                .saturating_add(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)),
        };

        self.cache.insert(key.as_str().to_string(), entry).await;
        Ok(())
    }

    async fn invalidate(&self, pattern: Option<&str>) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;

        let keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| pattern.is_none_or(|p| key.contains(p)))
            .map(|(key, _)| key.as_ref().clone())
            .collect();

        let mut removed = 0;
        for key in keys {
            if self.cache.remove(&key).await.is_some() {
                removed += 1;
            }
        }

        debug!(pattern = ?pattern, removed, "Invalidated cached responses");
        Ok(removed)
    }

    async fn len(&self) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }
}
