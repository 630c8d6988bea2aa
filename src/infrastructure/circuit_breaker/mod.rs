//! Per-route circuit breaker registry
//!
//! Breakers live in a DashMap; each admission or outcome mutates its breaker
//! while holding that entry's shard lock, so transitions are atomic per route.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{info, warn};

use crate::domain::circuit_breaker::{Admission, CircuitBreaker, CircuitState, CircuitTransition};
use crate::domain::events::{EventPublisher, GatewayEvent};
use crate::domain::route::{CircuitBreakerSettings, RouteId};
use crate::domain::DomainError;
use crate::infrastructure::observability::record_circuit_transition;

#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    breakers: DashMap<RouteId, CircuitBreaker>,
    events: Arc<dyn EventPublisher>,
}

impl CircuitBreakerRegistry {
    pub fn new(events: Arc<dyn EventPublisher>) -> Self {
        Self {
            breakers: DashMap::new(),
            events,
        }
    }

    /// Allocate a fresh breaker for a route, replacing any previous one
    pub fn create(&self, route_id: &RouteId, settings: CircuitBreakerSettings) -> CircuitBreaker {
        let breaker = CircuitBreaker::new(route_id.clone(), settings);
        self.breakers.insert(route_id.clone(), breaker.clone());
        breaker
    }

    pub fn remove(&self, route_id: &RouteId) -> bool {
        self.breakers.remove(route_id).is_some()
    }

    /// Swap a breaker's thresholds; state and counters are kept
    pub fn reconfigure(&self, route_id: &RouteId, settings: CircuitBreakerSettings) {
        match self.breakers.get_mut(route_id) {
            Some(mut breaker) => breaker.reconfigure(settings),
            None => {
                self.create(route_id, settings);
            }
        }
    }

    pub fn get(&self, route_id: &RouteId) -> Option<CircuitBreaker> {
        self.breakers.get(route_id).map(|b| b.clone())
    }

    /// All breakers, ordered by route id
    pub fn list(&self) -> Vec<CircuitBreaker> {
        let mut breakers: Vec<CircuitBreaker> =
            self.breakers.iter().map(|entry| entry.value().clone()).collect();
        breakers.sort_by(|a, b| a.route_id().cmp(b.route_id()));
        breakers
    }

    pub fn try_acquire(&self, route_id: &RouteId) -> Admission {
        self.try_acquire_at(route_id, Utc::now())
    }

    /// Routes without a breaker are always admitted
    pub fn try_acquire_at(&self, route_id: &RouteId, now: DateTime<Utc>) -> Admission {
        let Some(mut breaker) = self.breakers.get_mut(route_id) else {
            return Admission::Allowed;
        };

        let admission = breaker.try_acquire(now);
        if admission == Admission::Probe {
            info!(route_id = %route_id, "Circuit breaker half-open, probing upstream");
            record_circuit_transition(route_id.as_str(), CircuitState::HalfOpen.as_str());
        }

        admission
    }

    pub fn record_success(&self, route_id: &RouteId) {
        let transition = match self.breakers.get_mut(route_id) {
            Some(mut breaker) => breaker.record_success(),
            None => return,
        };

        if let Some(CircuitTransition::Closed) = transition {
            info!(route_id = %route_id, "Circuit breaker closed");
            record_circuit_transition(route_id.as_str(), CircuitState::Closed.as_str());
            self.events.publish(GatewayEvent::CircuitClosed {
                route_id: route_id.to_string(),
            });
        }
    }

    pub fn record_failure(&self, route_id: &RouteId) {
        self.record_failure_at(route_id, Utc::now());
    }

    pub fn record_failure_at(&self, route_id: &RouteId, now: DateTime<Utc>) {
        let (transition, failure_count) = match self.breakers.get_mut(route_id) {
            Some(mut breaker) => {
                let transition = breaker.record_failure(now);
                (transition, breaker.failure_count())
            }
            None => return,
        };

        if let Some(CircuitTransition::Opened) = transition {
            warn!(route_id = %route_id, failure_count, "Circuit breaker opened");
            record_circuit_transition(route_id.as_str(), CircuitState::Open.as_str());
            self.events.publish(GatewayEvent::CircuitOpened {
                route_id: route_id.to_string(),
                failure_count,
            });
        }
    }

    /// Force a breaker closed
    pub fn reset(&self, route_id: &RouteId) -> Result<CircuitBreaker, DomainError> {
        let breaker = {
            let mut breaker = self.breakers.get_mut(route_id).ok_or_else(|| {
                DomainError::not_found(format!("Circuit breaker for route '{}' not found", route_id))
            })?;
            breaker.reset();
            breaker.clone()
        };

        info!(route_id = %route_id, "Circuit breaker reset");
        record_circuit_transition(route_id.as_str(), CircuitState::Closed.as_str());
        self.events.publish(GatewayEvent::CircuitReset {
            route_id: route_id.to_string(),
        });

        Ok(breaker)
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
