//! Application state shared by handlers

use std::sync::Arc;

use crate::domain::cache::ResponseCache;
use crate::infrastructure::api_key::ApiKeyService;
use crate::infrastructure::circuit_breaker::CircuitBreakerRegistry;
use crate::infrastructure::events::BroadcastEventPublisher;
use crate::infrastructure::gateway::GatewayService;
use crate::infrastructure::rate_limit::RateLimiter;
use crate::infrastructure::route::RouteService;
use crate::infrastructure::telemetry::RequestLogStore;
use crate::infrastructure::upstream::ServiceRegistry;

/// Handles to every gateway component
#[derive(Clone, Debug)]
pub struct AppState {
    pub gateway: Arc<GatewayService>,
    pub routes: Arc<RouteService>,
    pub api_keys: Arc<ApiKeyService>,
    pub circuit_breakers: Arc<CircuitBreakerRegistry>,
    pub cache: Arc<dyn ResponseCache>,
    pub rate_limiter: Arc<RateLimiter>,
    pub services: Arc<ServiceRegistry>,
    pub request_logs: Arc<RequestLogStore>,
    pub events: BroadcastEventPublisher,
    /// Bearer token accepted on `/admin`; `None` leaves only admin API keys
    pub admin_token: Option<Arc<str>>,
    /// Largest proxied request body accepted
    pub max_body_bytes: usize,
}
