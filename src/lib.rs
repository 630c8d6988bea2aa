//! PMP API Gateway
//!
//! An embeddable API gateway that sits in front of internal services:
//! - Route table with path templates, lifecycle states and per-route policy
//! - API key and JWT authentication
//! - Per-route rate limiting, response caching and circuit breaking
//! - Request logs, aggregate statistics and a live event stream

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use infrastructure::{
    api_key::{ApiKeyGenerator, ApiKeyService, InMemoryApiKeyRepository},
    auth::{JwtVerifier, RouteAuthenticator},
    cache::InMemoryResponseCache,
    circuit_breaker::CircuitBreakerRegistry,
    events::BroadcastEventPublisher,
    gateway::GatewayService,
    rate_limit::RateLimiter,
    route::{InMemoryRouteRepository, RouteService},
    telemetry::RequestLogStore,
    upstream::{HttpUpstream, ServiceRegistry},
};
use tracing::info;

/// Wire every gateway component from configuration
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let gateway_config = &config.gateway;
    let events = BroadcastEventPublisher::default();

    let circuit_breakers = Arc::new(CircuitBreakerRegistry::new(Arc::new(events.clone())));

    let routes = Arc::new(
        RouteService::new(
            Arc::new(InMemoryRouteRepository::new()),
            circuit_breakers.clone(),
            Arc::new(events.clone()),
        )
        .with_default_circuit_breaker(gateway_config.circuit_breaker),
    );

    let api_keys = Arc::new(
        ApiKeyService::new(
            Arc::new(InMemoryApiKeyRepository::new()),
            Arc::new(events.clone()),
        )
        .with_generator(ApiKeyGenerator::new(gateway_config.api_key_prefix.clone())),
    );

    let services = Arc::new(ServiceRegistry::new());
    for definition in &gateway_config.services {
        services.register(&definition.name, &definition.url)?;
    }

    let cache = Arc::new(InMemoryResponseCache::new(gateway_config.cache_max_capacity));
    let rate_limiter = Arc::new(RateLimiter::new());
    let request_logs = Arc::new(RequestLogStore::new(
        gateway_config.request_log_capacity,
        Arc::new(events.clone()),
    ));

    let mut authenticator = RouteAuthenticator::new(api_keys.clone());
    if let Some(secret) = config.auth.jwt_secret.as_deref() {
        authenticator = authenticator.with_jwt_verifier(JwtVerifier::new(secret));
    } else {
        info!("No JWT secret configured, JWT routes check token presence only");
    }

    let gateway = Arc::new(
        GatewayService::new(
            routes.clone(),
            authenticator,
            rate_limiter.clone(),
            cache.clone(),
            circuit_breakers.clone(),
            Arc::new(HttpUpstream::new(services.clone())),
            request_logs.clone(),
        )
        .with_upstream_timeout(Duration::from_millis(gateway_config.upstream_timeout_ms)),
    );

    if gateway_config.seed_default_routes {
        routes.seed_defaults().await?;
    }

    Ok(AppState {
        gateway,
        routes,
        api_keys,
        circuit_breakers,
        cache,
        rate_limiter,
        services,
        request_logs,
        events,
        admin_token: config.auth.admin_token.as_deref().map(Arc::from),
        max_body_bytes: config.server.max_body_bytes,
    })
}
