//! Route domain
//!
//! Route definitions, their per-route policies and the path matching
//! algorithm used by the route table.

mod entity;
pub mod matcher;
mod policy;
mod repository;
mod validation;

pub use entity::{HttpMethod, Route, RouteId, RouteStatus, RouteUpdate};
pub use policy::{
    AuthConfig, AuthType, CacheConfig, CacheStrategy, CircuitBreakerSettings, RateLimitConfig,
    RateLimitKey, RateLimitStrategy, TransformConfig, ValidationConfig, DEFAULT_API_KEY_HEADER,
    MAX_POLICY_DURATION_MS,
};
pub use repository::RouteRepository;
pub use validation::{validate_duration_ms, validate_path, validate_route};
