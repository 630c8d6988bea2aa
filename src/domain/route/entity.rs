//! Route entity and related types

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::matcher;
use super::policy::{
    AuthConfig, CacheConfig, CircuitBreakerSettings, RateLimitConfig, TransformConfig,
    ValidationConfig,
};
use crate::domain::DomainError;

/// Route identifier, `route_<uuid>` when generated
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RouteId(String);

impl RouteId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();

        if id.trim().is_empty() {
            return Err(DomainError::invalid_id("Route ID cannot be empty"));
        }

        Ok(Self(id))
    }

    pub fn generate() -> Self {
        Self(format!("route_{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RouteId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RouteId> for String {
    fn from(id: RouteId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RouteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            other => Err(DomainError::validation(format!(
                "Unsupported HTTP method: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteStatus {
    #[default]
    Active,
    Deprecated,
    Disabled,
    Maintenance,
}

impl RouteStatus {
    /// Whether requests for the route reach the upstream
    pub fn is_serving(&self) -> bool {
        matches!(self, Self::Active | Self::Deprecated)
    }
}

/// A registered mapping from (path pattern, methods) to an upstream target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    id: RouteId,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    version: String,
    path: String,
    methods: Vec<HttpMethod>,
    status: RouteStatus,
    auth: AuthConfig,
    rate_limit: RateLimitConfig,
    cache: CacheConfig,
    validation: ValidationConfig,
    transform: TransformConfig,
    target_service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_path: Option<String>,
    circuit_breaker: CircuitBreakerSettings,
    tags: Vec<String>,
    metadata: HashMap<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Route {
    pub fn new(
        id: RouteId,
        name: impl Into<String>,
        path: impl Into<String>,
        methods: Vec<HttpMethod>,
        target_service: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            name: name.into(),
            description: None,
            version: "1.0.0".to_string(),
            path: path.into(),
            methods,
            status: RouteStatus::Active,
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::default(),
            cache: CacheConfig::default(),
            validation: ValidationConfig::default(),
            transform: TransformConfig::default(),
            target_service: target_service.into(),
            target_path: None,
            circuit_breaker: CircuitBreakerSettings::default(),
            tags: Vec::new(),
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_status(mut self, status: RouteStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_transform(mut self, transform: TransformConfig) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_target_path(mut self, target_path: impl Into<String>) -> Self {
        self.target_path = Some(target_path.into());
        self
    }

    pub fn with_circuit_breaker(mut self, settings: CircuitBreakerSettings) -> Self {
        self.circuit_breaker = settings;
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    // Getters

    pub fn id(&self) -> &RouteId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn methods(&self) -> &[HttpMethod] {
        &self.methods
    }

    pub fn status(&self) -> RouteStatus {
        self.status
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    pub fn rate_limit(&self) -> &RateLimitConfig {
        &self.rate_limit
    }

    pub fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    pub fn validation(&self) -> &ValidationConfig {
        &self.validation
    }

    pub fn transform(&self) -> &TransformConfig {
        &self.transform
    }

    pub fn target_service(&self) -> &str {
        &self.target_service
    }

    pub fn target_path(&self) -> Option<&str> {
        self.target_path.as_deref()
    }

    pub fn circuit_breaker(&self) -> &CircuitBreakerSettings {
        &self.circuit_breaker
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
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

    // Matching

    /// True if `path` matches this route's pattern and any of `methods` is allowed
    pub fn matches(&self, path: &str, methods: &[HttpMethod]) -> bool {
        matcher::path_matches(&self.path, path) && self.allows_any(methods)
    }

    /// True if both routes could serve the same (path, method) pair
    pub fn overlaps(&self, other: &Route) -> bool {
        matcher::patterns_overlap(&self.path, &other.path) && self.allows_any(&other.methods)
    }

    pub fn allows_any(&self, methods: &[HttpMethod]) -> bool {
        methods.iter().any(|m| self.methods.contains(m))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Upstream path for a concrete request path, with `:param` segments substituted
    pub fn upstream_path(&self, request_path: &str) -> String {
        match &self.target_path {
            Some(target) => {
                let params = matcher::extract_params(&self.path, request_path).unwrap_or_default();
                matcher::substitute_params(target, &params)
            }
            None => request_path.to_string(),
        }
    }

    // Mutations

    pub fn set_status(&mut self, status: RouteStatus) {
        self.status = status;
        self.touch();
    }

    /// Merge a partial update; identity and creation time are preserved
    pub fn apply(&mut self, update: RouteUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(version) = update.version {
            self.version = version;
        }
        if let Some(path) = update.path {
            self.path = path;
        }
        if let Some(methods) = update.methods {
            self.methods = methods;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(auth) = update.auth {
            self.auth = auth;
        }
        if let Some(rate_limit) = update.rate_limit {
            self.rate_limit = rate_limit;
        }
        if let Some(cache) = update.cache {
            self.cache = cache;
        }
        if let Some(validation) = update.validation {
            self.validation = validation;
        }
        if let Some(transform) = update.transform {
            self.transform = transform;
        }
        if let Some(target_service) = update.target_service {
            self.target_service = target_service;
        }
        if let Some(target_path) = update.target_path {
            self.target_path = Some(target_path);
        }
        if let Some(settings) = update.circuit_breaker {
            self.circuit_breaker = settings;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(metadata) = update.metadata {
            self.metadata = metadata;
        }

        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Partial route update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub path: Option<String>,
    pub methods: Option<Vec<HttpMethod>>,
    pub status: Option<RouteStatus>,
    pub auth: Option<AuthConfig>,
    pub rate_limit: Option<RateLimitConfig>,
    pub cache: Option<CacheConfig>,
    pub validation: Option<ValidationConfig>,
    pub transform: Option<TransformConfig>,
    pub target_service: Option<String>,
    pub target_path: Option<String>,
    pub circuit_breaker: Option<CircuitBreakerSettings>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<HashMap<String, Value>>,
}

impl RouteUpdate {
    pub fn status(status: RouteStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}
