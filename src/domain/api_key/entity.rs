//! API Key entity and related types

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::route::RateLimitStrategy;
use crate::domain::DomainError;

/// Permission granting access to the admin surface
pub const ADMIN_PERMISSION: &str = "admin";

/// API Key identifier, `key_<uuid>` when generated
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiKeyId(String);

impl ApiKeyId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();

        if id.trim().is_empty() {
            return Err(DomainError::invalid_id("API key ID cannot be empty"));
        }

        Ok(Self(id))
    }

    pub fn generate() -> Self {
        Self(format!("key_{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ApiKeyId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ApiKeyId> for String {
    fn from(id: ApiKeyId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ApiKeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiKeyStatus {
    /// Key is active and can be used
    #[default]
    Active,
    /// Key has been revoked; terminal
    Revoked,
    /// Key passed its expiry
    Expired,
}

impl ApiKeyStatus {
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Per-key rate limit that replaces the route's limit for this key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyRateLimit {
    pub requests: u32,
    pub window_ms: u64,
    #[serde(default)]
    pub strategy: RateLimitStrategy,
}

/// API Key entity
///
/// Only the SHA-256 digest of the secret is kept; the secret itself is
/// handed out once, on issue or rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    id: ApiKeyId,
    name: String,
    #[serde(skip_serializing)]
    key_hash: String,
    /// Recognizable start of the secret, safe to display
    key_prefix: String,
    organization_id: String,
    user_id: String,
    status: ApiKeyStatus,
    permissions: Vec<String>,
    allowed_routes: Vec<String>,
    allowed_ips: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rate_limit: Option<ApiKeyRateLimit>,
    usage_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_used_at: Option<DateTime<Utc>>,
    metadata: HashMap<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ApiKey {
    pub fn new(
        id: ApiKeyId,
        name: impl Into<String>,
        key_hash: impl Into<String>,
        key_prefix: impl Into<String>,
        organization_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            name: name.into(),
            key_hash: key_hash.into(),
            key_prefix: key_prefix.into(),
            organization_id: organization_id.into(),
            user_id: user_id.into(),
            status: ApiKeyStatus::Active,
            permissions: Vec::new(),
            allowed_routes: Vec::new(),
            allowed_ips: Vec::new(),
            expires_at: None,
            rate_limit: None,
            usage_count: 0,
            last_used_at: None,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_allowed_routes(mut self, routes: Vec<String>) -> Self {
        self.allowed_routes = routes;
        self
    }

    pub fn with_allowed_ips(mut self, ips: Vec<String>) -> Self {
        self.allowed_ips = ips;
        self
    }

    pub fn with_expiration(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: ApiKeyRateLimit) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    // Getters

    pub fn id(&self) -> &ApiKeyId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_hash(&self) -> &str {
        &self.key_hash
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn status(&self) -> ApiKeyStatus {
        self.status
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    pub fn allowed_routes(&self) -> &[String] {
        &self.allowed_routes
    }

    pub fn allowed_ips(&self) -> &[String] {
        &self.allowed_ips
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn rate_limit(&self) -> Option<&ApiKeyRateLimit> {
        self.rate_limit.as_ref()
    }

    pub fn usage_count(&self) -> u64 {
        self.usage_count
    }

    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }

    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Checks

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| now > expires)
    }

    /// Active and not past its expiry
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.status.is_usable() && !self.is_expired_at(now)
    }

    /// An empty allow-list admits every address
    pub fn allows_ip(&self, ip: &str) -> bool {
        self.allowed_ips.is_empty() || self.allowed_ips.iter().any(|allowed| allowed == ip)
    }

    /// An empty allow-list admits every route
    pub fn allows_route(&self, route_id: &str) -> bool {
        self.allowed_routes.is_empty() || self.allowed_routes.iter().any(|r| r == route_id)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission || p == "*")
    }

    pub fn is_admin(&self) -> bool {
        self.has_permission(ADMIN_PERMISSION)
    }

    // Mutations

    /// Revoke the key; revocation is terminal
    pub fn revoke(&mut self) {
        self.status = ApiKeyStatus::Revoked;
        self.touch();
    }

    /// Flag an active key whose expiry has passed
    pub fn mark_expired(&mut self) {
        if self.status == ApiKeyStatus::Active {
            self.status = ApiKeyStatus::Expired;
            self.touch();
        }
    }

    /// Swap in a new secret digest; identity, permissions and usage are kept
    pub fn rotate_secret(&mut self, key_hash: impl Into<String>, key_prefix: impl Into<String>) {
        self.key_hash = key_hash.into();
        self.key_prefix = key_prefix.into();
        self.touch();
    }

    pub fn record_usage(&mut self, at: DateTime<Utc>) {
        self.usage_count += 1;
        self.last_used_at = Some(at);
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
