//! Gateway events
//!
//! Emitted fire-and-forget; publishers never block or fail the caller.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum GatewayEvent {
    #[serde(rename = "route.created")]
    RouteCreated { route_id: String, path: String },
    #[serde(rename = "route.updated")]
    RouteUpdated { route_id: String },
    #[serde(rename = "route.deleted")]
    RouteDeleted { route_id: String },
    #[serde(rename = "apikey.created")]
    ApiKeyCreated {
        key_id: String,
        organization_id: String,
    },
    #[serde(rename = "apikey.revoked")]
    ApiKeyRevoked { key_id: String },
    #[serde(rename = "apikey.rotated")]
    ApiKeyRotated { key_id: String },
    #[serde(rename = "circuit.opened")]
    CircuitOpened { route_id: String, failure_count: u32 },
    #[serde(rename = "circuit.closed")]
    CircuitClosed { route_id: String },
    #[serde(rename = "circuit.reset")]
    CircuitReset { route_id: String },
    #[serde(rename = "request.logged")]
    RequestLogged {
        log_id: String,
        route_id: String,
        status_code: u16,
    },
}

impl GatewayEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RouteCreated { .. } => "route.created",
            Self::RouteUpdated { .. } => "route.updated",
            Self::RouteDeleted { .. } => "route.deleted",
            Self::ApiKeyCreated { .. } => "apikey.created",
            Self::ApiKeyRevoked { .. } => "apikey.revoked",
            Self::ApiKeyRotated { .. } => "apikey.rotated",
            Self::CircuitOpened { .. } => "circuit.opened",
            Self::CircuitClosed { .. } => "circuit.closed",
            Self::CircuitReset { .. } => "circuit.reset",
            Self::RequestLogged { .. } => "request.logged",
        }
    }
}

/// An event with its emission time
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    #[serde(flatten)]
    pub event: GatewayEvent,
    pub timestamp: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn now(event: GatewayEvent) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
        }
    }
}

pub trait EventPublisher: Send + Sync + Debug {
    fn publish(&self, event: GatewayEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_uses_dotted_type() {
        let event = GatewayEvent::CircuitOpened {
            route_id: "route_a".to_string(),
            failure_count: 5,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "circuit.opened");
        assert_eq!(json["route_id"], "route_a");
        assert_eq!(json["failure_count"], 5);
        assert_eq!(event.name(), "circuit.opened");
    }

    #[test]
    fn test_envelope_flattens_event() {
        let envelope = EventEnvelope::now(GatewayEvent::RouteDeleted {
            route_id: "route_a".to_string(),
        });

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], "route.deleted");
        assert!(json.get("timestamp").is_some());
    }
}
