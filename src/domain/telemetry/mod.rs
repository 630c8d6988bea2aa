//! Request telemetry domain

mod request_log;
mod stats;

pub use request_log::{RequestLog, UNMATCHED_ROUTE};
pub use stats::{ErrorCount, GatewayStats, RouteCount};
