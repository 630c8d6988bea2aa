//! Gateway core

mod service;

pub use service::{GatewayService, DEFAULT_UPSTREAM_TIMEOUT};
