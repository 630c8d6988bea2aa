//! Infrastructure layer - stores, services and adapters behind the domain traits

pub mod api_key;
pub mod auth;
pub mod cache;
pub mod circuit_breaker;
pub mod events;
pub mod gateway;
pub mod observability;
pub mod rate_limit;
pub mod route;
pub mod telemetry;
pub mod upstream;
