//! Circuit breaker domain
//!
//! Per-route failure isolation. States:
//! - Closed: normal operation, requests pass through
//! - Open: upstream is failing, requests are rejected without calling it
//! - HalfOpen: retry time has passed, requests pass through as probes
//!
//! The state machine is pure; callers supply the clock and own the locking.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::route::{CircuitBreakerSettings, RouteId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    #[default]
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::HalfOpen => "HALF_OPEN",
        }
    }
}

/// Outcome of asking a breaker to admit a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// Breaker moved from Open to HalfOpen; this request is a probe
    Probe,
    Rejected,
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// State change produced by an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitTransition {
    Opened,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreaker {
    route_id: RouteId,
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_failure: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    opened_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_retry: Option<DateTime<Utc>>,
    failure_threshold: u32,
    success_threshold: u32,
    timeout_ms: u64,
}

impl CircuitBreaker {
    pub fn new(route_id: RouteId, settings: CircuitBreakerSettings) -> Self {
        Self {
            route_id,
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure: None,
            opened_at: None,
            next_retry: None,
            failure_threshold: settings.failure_threshold,
            success_threshold: settings.success_threshold,
            timeout_ms: settings.timeout_ms,
        }
    }

    pub fn route_id(&self) -> &RouteId {
        &self.route_id
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn success_count(&self) -> u32 {
        self.success_count
    }

    pub fn last_failure(&self) -> Option<DateTime<Utc>> {
        self.last_failure
    }

    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.opened_at
    }

    pub fn next_retry(&self) -> Option<DateTime<Utc>> {
        self.next_retry
    }

    pub fn settings(&self) -> CircuitBreakerSettings {
        CircuitBreakerSettings {
            failure_threshold: self.failure_threshold,
            success_threshold: self.success_threshold,
            timeout_ms: self.timeout_ms,
        }
    }

    /// Decide whether a request may reach the upstream at `now`
    pub fn try_acquire(&mut self, now: DateTime<Utc>) -> Admission {
        match self.state {
            CircuitState::Closed | CircuitState::HalfOpen => Admission::Allowed,
            CircuitState::Open => match self.next_retry {
                Some(retry) if now > retry => {
                    self.state = CircuitState::HalfOpen;
                    Admission::Probe
                }
                _ => Admission::Rejected,
            },
        }
    }

    pub fn record_success(&mut self) -> Option<CircuitTransition> {
        self.success_count += 1;
        self.failure_count = 0;

        if self.state == CircuitState::HalfOpen && self.success_count >= self.success_threshold {
            self.close();
            return Some(CircuitTransition::Closed);
        }

        None
    }

    pub fn record_failure(&mut self, now: DateTime<Utc>) -> Option<CircuitTransition> {
        self.failure_count += 1;
        self.success_count = 0;
        self.last_failure = Some(now);

        if self.failure_count >= self.failure_threshold {
            let was_open = self.state == CircuitState::Open;

            self.state = CircuitState::Open;
            self.opened_at = Some(now);
            self.next_retry = Some(retry_at(now, self.timeout_ms));

            if !was_open {
                return Some(CircuitTransition::Opened);
            }
        }

        None
    }

    /// Force the breaker closed and clear all counters
    pub fn reset(&mut self) {
        self.close();
        self.last_failure = None;
    }

    /// Replace static thresholds; counters and state are kept
    pub fn reconfigure(&mut self, settings: CircuitBreakerSettings) {
        self.failure_threshold = settings.failure_threshold;
        self.success_threshold = settings.success_threshold;
        self.timeout_ms = settings.timeout_ms;
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.failure_count = 0;
        self.success_count = 0;
        self.opened_at = None;
        self.next_retry = None;
    }
}

/// `now + timeout_ms`, pinned to the latest representable instant on overflow
fn retry_at(now: DateTime<Utc>, timeout_ms: u64) -> DateTime<Utc> {
    i64::try_from(timeout_ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .and_then(|timeout| now.checked_add_signed(timeout))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
