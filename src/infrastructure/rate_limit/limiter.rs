//! Keyed request counters
//!
//! Every check is a single read-modify-write under the DashMap shard lock of
//! its key, so two concurrent requests can never both take the last slot.

use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use crate::domain::route::{RateLimitConfig, RateLimitStrategy};

/// Limits applied to one counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateQuota {
    pub requests: u32,
    pub window_ms: u64,
    pub strategy: RateLimitStrategy,
    /// Bucket capacity for the bucket strategies
    pub burst_limit: Option<u32>,
}

impl RateQuota {
    pub fn new(requests: u32, window_ms: u64, strategy: RateLimitStrategy) -> Self {
        Self {
            requests,
            window_ms,
            strategy,
            burst_limit: None,
        }
    }

    fn window(&self) -> u64 {
        self.window_ms.max(1)
    }

    fn capacity(&self) -> f64 {
        f64::from(self.burst_limit.unwrap_or(self.requests))
    }

    /// Units refilled (or drained) per millisecond
    fn rate_per_ms(&self) -> f64 {
        f64::from(self.requests) / self.window() as f64
    }

    /// How long a counter can sit idle before forgetting it changes no decision
    fn idle_ttl_ms(&self) -> u64 {
        match self.strategy {
            RateLimitStrategy::FixedWindow => self.window(),
            RateLimitStrategy::SlidingWindow => self.window().saturating_mul(2),
            RateLimitStrategy::TokenBucket | RateLimitStrategy::LeakyBucket => {
                let rate = self.rate_per_ms();
                if rate > 0.0 {
                    ((self.capacity() / rate).ceil() as u64).max(self.window())
                } else {
                    self.window()
                }
            }
        }
    }

    /// Whole seconds a limited client should wait, never zero and never past the window
    fn retry_after_secs(&self, wait_ms: f64) -> u64 {
        let secs = (wait_ms.max(0.0) / 1000.0).ceil() as u64;
        secs.clamp(1, (self.window() / 1000).max(1))
    }
}

impl From<&RateLimitConfig> for RateQuota {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            requests: config.requests,
            window_ms: config.window_ms,
            strategy: config.strategy,
            burst_limit: config.burst_limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { limit: u32, remaining: u32 },
    Limited { limit: u32, retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

#[derive(Debug, Clone, Copy)]
enum Counter {
    FixedWindow {
        window_start: u64,
        count: u32,
    },
    SlidingWindow {
        window_start: u64,
        count: u32,
        previous: u32,
    },
    TokenBucket {
        tokens: f64,
        updated_at: u64,
    },
    LeakyBucket {
        level: f64,
        updated_at: u64,
    },
}

impl Counter {
    fn fresh(quota: &RateQuota, now_ms: u64) -> Self {
        match quota.strategy {
            RateLimitStrategy::FixedWindow => Self::FixedWindow {
                window_start: now_ms,
                count: 0,
            },
            RateLimitStrategy::SlidingWindow => Self::SlidingWindow {
                window_start: now_ms,
                count: 0,
                previous: 0,
            },
            RateLimitStrategy::TokenBucket => Self::TokenBucket {
                tokens: quota.capacity(),
                updated_at: now_ms,
            },
            RateLimitStrategy::LeakyBucket => Self::LeakyBucket {
                level: 0.0,
                updated_at: now_ms,
            },
        }
    }

    fn strategy(&self) -> RateLimitStrategy {
        match self {
            Self::FixedWindow { .. } => RateLimitStrategy::FixedWindow,
            Self::SlidingWindow { .. } => RateLimitStrategy::SlidingWindow,
            Self::TokenBucket { .. } => RateLimitStrategy::TokenBucket,
            Self::LeakyBucket { .. } => RateLimitStrategy::LeakyBucket,
        }
    }

    fn admit(&mut self, quota: &RateQuota, now_ms: u64) -> RateDecision {
        let limit = quota.requests;
        let window = quota.window();

        match self {
            Self::FixedWindow {
                window_start,
                count,
            } => {
                if now_ms.saturating_sub(*window_start) >= window {
                    *window_start = now_ms;
                    *count = 0;
                }

                if *count >= limit {
                    let remaining_ms = window - now_ms.saturating_sub(*window_start);
                    return RateDecision::Limited {
                        limit,
                        retry_after_secs: quota.retry_after_secs(remaining_ms as f64),
                    };
                }

                *count += 1;
                RateDecision::Allowed {
                    limit,
                    remaining: limit - *count,
                }
            }
            Self::SlidingWindow {
                window_start,
                count,
                previous,
            } => {
                let elapsed = now_ms.saturating_sub(*window_start);
                if elapsed >= window.saturating_mul(2) {
                    *window_start = now_ms;
                    *previous = 0;
                    *count = 0;
                } else if elapsed >= window {
                    *window_start = window_start.saturating_add(window);
                    *previous = *count;
                    *count = 0;
                }

                let elapsed = now_ms.saturating_sub(*window_start);
                let weight = 1.0 - elapsed as f64 / window as f64;
                let estimate = f64::from(*previous) * weight + f64::from(*count);

                if estimate >= f64::from(limit) {
                    return RateDecision::Limited {
                        limit,
                        retry_after_secs: quota.retry_after_secs((window - elapsed) as f64),
                    };
                }

                *count += 1;
                let remaining = (f64::from(limit) - estimate - 1.0).max(0.0).floor() as u32;
                RateDecision::Allowed { limit, remaining }
            }
            Self::TokenBucket { tokens, updated_at } => {
                let rate = quota.rate_per_ms();
                let refilled = now_ms.saturating_sub(*updated_at) as f64 * rate;
                *tokens = (*tokens + refilled).min(quota.capacity());
                *updated_at = now_ms;

                if *tokens < 1.0 {
                    let wait_ms = if rate > 0.0 {
                        (1.0 - *tokens) / rate
                    } else {
                        window as f64
                    };
                    return RateDecision::Limited {
                        limit,
                        retry_after_secs: quota.retry_after_secs(wait_ms),
                    };
                }

                *tokens -= 1.0;
                RateDecision::Allowed {
                    limit,
                    remaining: tokens.floor() as u32,
                }
            }
            Self::LeakyBucket { level, updated_at } => {
                let rate = quota.rate_per_ms();
                let drained = now_ms.saturating_sub(*updated_at) as f64 * rate;
                *level = (*level - drained).max(0.0);
                *updated_at = now_ms;

                let capacity = quota.capacity();
                if *level + 1.0 > capacity {
                    let wait_ms = if rate > 0.0 {
                        (*level + 1.0 - capacity) / rate
                    } else {
                        window as f64
                    };
                    return RateDecision::Limited {
                        limit,
                        retry_after_secs: quota.retry_after_secs(wait_ms),
                    };
                }

                *level += 1.0;
                RateDecision::Allowed {
                    limit,
                    remaining: (capacity - *level).max(0.0).floor() as u32,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CounterEntry {
    counter: Counter,
    last_seen_ms: u64,
    idle_ttl_ms: u64,
}

/// In-memory rate limiter shared by all routes
#[derive(Debug, Default)]
pub struct RateLimiter {
    counters: DashMap<String, CounterEntry>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter key for a route, identity kind (`ip`, `user`, `key`) and identity
    pub fn key(route_id: &str, scope: &str, identity: &str) -> String {
        format!("rate:{route_id}:{scope}:{identity}")
    }

    pub fn check_and_increment(&self, key: &str, quota: &RateQuota) -> RateDecision {
        self.check_at(key, quota, now_ms())
    }

    /// Check and count a request at an explicit clock reading
    pub fn check_at(&self, key: &str, quota: &RateQuota, now_ms: u64) -> RateDecision {
        let mut entry = self
            .counters
            .entry(key.to_string())
            .or_insert_with(|| CounterEntry {
                counter: Counter::fresh(quota, now_ms),
                last_seen_ms: now_ms,
                idle_ttl_ms: quota.idle_ttl_ms(),
            });

        // A route's strategy can change under a live counter
        if entry.counter.strategy() != quota.strategy {
            entry.counter = Counter::fresh(quota, now_ms);
        }

        let decision = entry.counter.admit(quota, now_ms);
        entry.last_seen_ms = now_ms;
        entry.idle_ttl_ms = quota.idle_ttl_ms();

        if !decision.is_allowed() {
            debug!(key = %key, strategy = ?quota.strategy, "Rate limit exceeded");
        }

        decision
    }

    /// Drop counters idle long enough to have fully reset; returns how many were removed
    pub fn sweep_expired(&self, now_ms: u64) -> usize {
        let before = self.counters.len();
        self.counters
            .retain(|_, entry| now_ms.saturating_sub(entry.last_seen_ms) < entry.idle_ttl_ms);
        before.saturating_sub(self.counters.len())
    }

    pub fn sweep(&self) -> usize {
        self.sweep_expired(now_ms())
    }

    pub fn reset(&self, key: &str) -> bool {
        self.counters.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
