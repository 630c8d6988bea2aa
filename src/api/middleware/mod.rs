//! API middleware components

pub mod admin_auth;
pub mod logging;
pub mod metrics;

pub use admin_auth::{AdminAuth, RequireAdmin};
pub use logging::{logging_middleware, redact_headers};
pub use metrics::metrics_middleware;
