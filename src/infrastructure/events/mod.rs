//! Event bus backed by a tokio broadcast channel

use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::events::{EventEnvelope, EventPublisher, GatewayEvent};

const DEFAULT_CAPACITY: usize = 1024;

/// Fans events out to every live subscriber
///
/// Slow subscribers lose the oldest events; publishing never waits.
#[derive(Debug, Clone)]
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<EventEnvelope>,
}

impl BroadcastEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventPublisher for BroadcastEventPublisher {
    fn publish(&self, event: GatewayEvent) {
        trace!(event = event.name(), "Publishing gateway event");
        // No subscribers is not an error
        let _ = self.sender.send(EventEnvelope::now(event));
    }
}
