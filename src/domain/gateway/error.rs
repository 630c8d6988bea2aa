//! Request pipeline failures
//!
//! Every variant maps to an HTTP-shaped response; none aborts the gateway.

use thiserror::Error;

use super::response::GatewayResponse;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Route not found")]
    RouteNotFound,

    /// Disabled, under maintenance, or circuit open
    #[error("{0}")]
    RouteUnavailable(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Rate limit exceeded")]
    RateLimited { limit: u32, retry_after_secs: u64 },

    #[error("{0}")]
    ValidationFailed(String),

    #[error("{0}")]
    UpstreamFailure(String),

    #[error("{0}")]
    Internal(String),
}

impl PipelineError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::RouteUnavailable(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamFailure(message.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::RouteNotFound => 404,
            Self::RouteUnavailable(_) => 503,
            Self::Unauthorized(_) => 401,
            Self::RateLimited { .. } => 429,
            Self::ValidationFailed(_) => 400,
            Self::UpstreamFailure(_) | Self::Internal(_) => 500,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    pub fn into_response(self) -> GatewayResponse {
        let response = GatewayResponse::error(self.status_code(), self.to_string());

        match self {
            Self::RateLimited {
                limit,
                retry_after_secs,
            } => response
                .with_header("Retry-After", retry_after_secs.to_string())
                .with_header("X-RateLimit-Limit", limit.to_string())
                .with_header("X-RateLimit-Remaining", "0"),
            _ => response,
        }
    }
}
