//! Per-route policy configuration
//!
//! Each policy is a typed struct with an `enabled` switch (or, for auth,
//! a `required` flag). Defaults describe a route with every policy off.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Authentication scheme required by a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthType {
    #[default]
    None,
    ApiKey,
    Jwt,
    Oauth2,
    Basic,
    Hmac,
}

impl AuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::ApiKey => "API_KEY",
            Self::Jwt => "JWT",
            Self::Oauth2 => "OAUTH2",
            Self::Basic => "BASIC",
            Self::Hmac => "HMAC",
        }
    }
}

/// Header used for API key authentication when a route doesn't name one
pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

/// Longest window, TTL or breaker timeout a policy may configure (one year)
pub const MAX_POLICY_DURATION_MS: u64 = 365 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(rename = "type", default)]
    pub auth_type: AuthType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    /// Header carrying the API key (defaults to `X-API-Key`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_header: Option<String>,
    /// Expected `iss` claim when JWT signatures are verified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_issuer: Option<String>,
}

impl AuthConfig {
    pub fn new(auth_type: AuthType) -> Self {
        Self {
            auth_type,
            required: auth_type != AuthType::None,
            ..Default::default()
        }
    }

    /// Header name for API key lookup, lower-cased
    pub fn api_key_header(&self) -> String {
        self.api_key_header
            .as_deref()
            .unwrap_or(DEFAULT_API_KEY_HEADER)
            .to_lowercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateLimitStrategy {
    #[default]
    FixedWindow,
    SlidingWindow,
    TokenBucket,
    LeakyBucket,
}

/// Which client identity a rate-limit counter is keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateLimitKey {
    #[default]
    Ip,
    User,
    ApiKey,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub strategy: RateLimitStrategy,
    /// Requests allowed per window
    pub requests: u32,
    pub window_ms: u64,
    #[serde(default)]
    pub key_generator: RateLimitKey,
    /// Bucket capacity for the bucket strategies (defaults to `requests`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst_limit: Option<u32>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            strategy: RateLimitStrategy::FixedWindow,
            requests: 100,
            window_ms: 60_000,
            key_generator: RateLimitKey::Ip,
            burst_limit: None,
        }
    }
}

impl RateLimitConfig {
    /// Enabled fixed-window limit keyed by client IP
    pub fn fixed_window(requests: u32, window_ms: u64) -> Self {
        Self {
            enabled: true,
            requests,
            window_ms,
            ..Default::default()
        }
    }

    pub fn with_strategy(mut self, strategy: RateLimitStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_key_generator(mut self, key_generator: RateLimitKey) -> Self {
        self.key_generator = key_generator;
        self
    }

    pub fn with_burst_limit(mut self, burst_limit: u32) -> Self {
        self.burst_limit = Some(burst_limit);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheStrategy {
    #[default]
    None,
    Public,
    Private,
    StaleWhileRevalidate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub strategy: CacheStrategy,
    pub ttl_ms: u64,
    /// Header names folded into the cache key
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vary_by: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            strategy: CacheStrategy::None,
            ttl_ms: 60_000,
            vary_by: Vec::new(),
        }
    }
}

impl CacheConfig {
    pub fn public(ttl_ms: u64) -> Self {
        Self {
            enabled: true,
            strategy: CacheStrategy::Public,
            ttl_ms,
            vary_by: Vec::new(),
        }
    }

    pub fn with_vary_by(mut self, headers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.vary_by = headers.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ValidationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_headers: Vec<String>,
    /// Query or path parameters that must be present
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_params: Vec<String>,
    /// Maximum serialized body length in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_body_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TransformConfig {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub request_headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub response_headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strip_headers: Vec<String>,
}

impl TransformConfig {
    pub fn is_empty(&self) -> bool {
        self.request_headers.is_empty()
            && self.response_headers.is_empty()
            && self.strip_headers.is_empty()
    }
}

/// Static thresholds of a route's circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerSettings {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub timeout_ms: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 3,
            timeout_ms: 30_000,
        }
    }
}
