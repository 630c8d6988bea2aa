//! Rate limiting infrastructure

mod limiter;

pub use limiter::{RateDecision, RateLimiter, RateQuota};
