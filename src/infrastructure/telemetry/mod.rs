//! Request log ring buffer and statistics

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::events::{EventPublisher, GatewayEvent};
use crate::domain::telemetry::{GatewayStats, RequestLog};
use crate::infrastructure::observability::{record_gateway_request, GatewayRequestMetric};

/// Bounded request log; the oldest entries are evicted first
#[derive(Debug)]
pub struct RequestLogStore {
    logs: Mutex<VecDeque<RequestLog>>,
    capacity: usize,
    events: Arc<dyn EventPublisher>,
}

impl RequestLogStore {
    pub fn new(capacity: usize, events: Arc<dyn EventPublisher>) -> Self {
        let capacity = capacity.max(1);

        Self {
            logs: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            events,
        }
    }

    pub async fn record(&self, log: RequestLog) {
        record_gateway_request(GatewayRequestMetric {
            route_id: &log.route_id,
            method: log.method.as_str(),
            status: log.status_code,
            duration: Duration::from_millis(log.duration_ms),
            cached: log.cached,
            rate_limited: log.rate_limited,
        });

        let event = GatewayEvent::RequestLogged {
            log_id: log.id.clone(),
            route_id: log.route_id.clone(),
            status_code: log.status_code,
        };

        {
            let mut logs = self.logs.lock().await;
            logs.push_back(log);
            while logs.len() > self.capacity {
                logs.pop_front();
            }
        }

        self.events.publish(event);
    }

    /// Most recent logs first
    pub async fn recent(&self, limit: usize, offset: usize) -> Vec<RequestLog> {
        let logs = self.logs.lock().await;
        logs.iter().rev().skip(offset).take(limit).cloned().collect()
    }

    /// Aggregate over retained logs, optionally only those at or after `since`
    pub async fn stats(&self, since: Option<DateTime<Utc>>, active_api_keys: usize) -> GatewayStats {
        let logs = self.logs.lock().await;

        GatewayStats::from_logs(
            logs.iter()
                .filter(|log| since.is_none_or(|since| log.timestamp >= since)),
            active_api_keys,
        )
    }

    pub async fn len(&self) -> usize {
        self.logs.lock().await.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
