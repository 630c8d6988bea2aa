//! The request pipeline
//!
//! Stages run in order and any of them may end the request early:
//! route match, lifecycle, circuit, auth, rate limit, cache lookup,
//! validation, request transform, forward, cache store, response transform.
//! Every request is logged, whichever stage produced the response.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, warn};

use crate::domain::cache::{CacheKey, CachedResponse, ResponseCache};
use crate::domain::circuit_breaker::Admission;
use crate::domain::gateway::{GatewayRequest, GatewayResponse, PipelineError};
use crate::domain::route::{matcher, HttpMethod, RateLimitKey, Route, RouteStatus};
use crate::domain::telemetry::{RequestLog, UNMATCHED_ROUTE};
use crate::domain::upstream::{Upstream, UpstreamResponse};
use crate::domain::DomainError;
use crate::infrastructure::auth::RouteAuthenticator;
use crate::infrastructure::circuit_breaker::CircuitBreakerRegistry;
use crate::infrastructure::observability::record_upstream_failure;
use crate::infrastructure::rate_limit::{RateDecision, RateLimiter, RateQuota};
use crate::infrastructure::route::RouteService;
use crate::infrastructure::telemetry::RequestLogStore;

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// What the pipeline learned about a request, for the request log
#[derive(Debug, Default)]
struct RequestTrace {
    route_id: Option<String>,
    api_key_id: Option<String>,
    rate_limited: bool,
    error: Option<String>,
}

/// Headers added to every response from a matched route
#[derive(Debug, Default)]
struct ResponseDecoration {
    deprecated: bool,
    rate_limit: Option<(u32, u32)>,
}

impl ResponseDecoration {
    fn apply(&self, mut response: GatewayResponse) -> GatewayResponse {
        if self.deprecated {
            response = response.with_header("Deprecation", "true");
        }
        if let Some((limit, remaining)) = self.rate_limit {
            response = response
                .with_header("X-RateLimit-Limit", limit.to_string())
                .with_header("X-RateLimit-Remaining", remaining.to_string());
        }
        response
    }
}

pub struct GatewayService {
    routes: Arc<RouteService>,
    authenticator: RouteAuthenticator,
    rate_limiter: Arc<RateLimiter>,
    cache: Arc<dyn ResponseCache>,
    circuit_breakers: Arc<CircuitBreakerRegistry>,
    upstream: Arc<dyn Upstream>,
    request_logs: Arc<RequestLogStore>,
    upstream_timeout: Duration,
}

impl std::fmt::Debug for GatewayService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayService")
            .field("routes", &self.routes)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish_non_exhaustive()
    }
}

impl GatewayService {
    pub fn new(
        routes: Arc<RouteService>,
        authenticator: RouteAuthenticator,
        rate_limiter: Arc<RateLimiter>,
        cache: Arc<dyn ResponseCache>,
        circuit_breakers: Arc<CircuitBreakerRegistry>,
        upstream: Arc<dyn Upstream>,
        request_logs: Arc<RequestLogStore>,
    ) -> Self {
        Self {
            routes,
            authenticator,
            rate_limiter,
            cache,
            circuit_breakers,
            upstream,
            request_logs,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Run a request through the pipeline; never fails, errors become responses
    pub async fn handle_request(&self, mut request: GatewayRequest) -> GatewayResponse {
        let started = Instant::now();
        let mut trace = RequestTrace::default();

        let mut response = match self.process(&mut request, &mut trace).await {
            Ok(response) => response,
            Err(err) => {
                debug!(request_id = %request.request_id, error = %err, "Request rejected");
                trace.rate_limited = err.is_rate_limited();
                trace.error = Some(err.to_string());
                err.into_response()
            }
        };

        response.duration_ms = started.elapsed().as_millis() as u64;
        self.log(&request, trace, &response).await;
        response
    }

    async fn process(
        &self,
        request: &mut GatewayRequest,
        trace: &mut RequestTrace,
    ) -> Result<GatewayResponse, PipelineError> {
        let route = self
            .routes
            .find_by_path(&request.path, &[request.method])
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))?
            .ok_or(PipelineError::RouteNotFound)?;
        trace.route_id = Some(route.id().to_string());

        let mut decoration = ResponseDecoration::default();
        match route.status() {
            RouteStatus::Disabled => return Err(PipelineError::unavailable("Route is disabled")),
            RouteStatus::Maintenance => {
                return Err(PipelineError::unavailable("Route is under maintenance"));
            }
            RouteStatus::Deprecated => decoration.deprecated = true,
            RouteStatus::Active => {}
        }

        if self.circuit_breakers.try_acquire(route.id()) == Admission::Rejected {
            return Err(PipelineError::unavailable(
                "Service unavailable (circuit open)",
            ));
        }

        let auth = self.authenticator.authenticate(request, &route).await?;
        if auth.user_id.is_some() {
            request.user_id = auth.user_id;
        }
        trace.api_key_id = auth.api_key.as_ref().map(|key| key.id().to_string());

        if route.rate_limit().enabled {
            let quota = match auth.api_key.as_ref().and_then(|key| key.rate_limit()) {
                Some(limit) => RateQuota::new(limit.requests, limit.window_ms, limit.strategy),
                None => RateQuota::from(route.rate_limit()),
            };
            let (scope, identity) =
                rate_limit_identity(request, &route, trace.api_key_id.as_deref());
            let key = RateLimiter::key(route.id().as_str(), scope, identity);

            match self.rate_limiter.check_and_increment(&key, &quota) {
                RateDecision::Allowed { limit, remaining } => {
                    decoration.rate_limit = Some((limit, remaining));
                }
                RateDecision::Limited {
                    limit,
                    retry_after_secs,
                } => {
                    warn!(route_id = %route.id(), key = %key, "Rate limit exceeded");
                    return Err(PipelineError::RateLimited {
                        limit,
                        retry_after_secs,
                    });
                }
            }
        }

        let cache_key = (route.cache().enabled && request.method == HttpMethod::Get)
            .then(|| CacheKey::for_request(request, &route.cache().vary_by));

        if let Some(key) = &cache_key {
            match self.cache.get(key).await {
                Ok(Some(hit)) => {
                    debug!(key = %key.as_str(), "Cache hit");
                    let mut response = GatewayResponse::new(hit.status, hit.body);
                    response.headers = hit.headers;
                    response.cached = true;
                    let response = response.with_header("X-Cache", "HIT");
                    return Ok(decoration.apply(response));
                }
                Ok(None) => {}
                Err(err) => warn!(key = %key.as_str(), error = %err, "Cache lookup failed"),
            }
        }

        validate(request, &route)?;
        transform_request(request, &route);

        let upstream = self.forward(request, &route).await?;

        let mut response = GatewayResponse::new(upstream.status, upstream.body);
        response.headers = upstream.headers;
        response.from_service = Some(route.target_service().to_string());

        if let Some(key) = cache_key.as_ref().filter(|_| response.status == 200) {
            let entry = CachedResponse {
                status: response.status,
                headers: response.headers.clone(),
                body: response.body.clone(),
            };
            let ttl = Duration::from_millis(route.cache().ttl_ms);
            match self.cache.set(key, entry, ttl).await {
                Ok(()) => response = response.with_header("X-Cache", "MISS"),
                Err(err) => warn!(key = %key.as_str(), error = %err, "Cache store failed"),
            }
        }

        for (name, value) in &route.transform().response_headers {
            response = response.with_header(name.clone(), value.clone());
        }

        Ok(decoration.apply(response))
    }

    /// Call the upstream under the timeout and feed the outcome to the breaker
    async fn forward(
        &self,
        request: &GatewayRequest,
        route: &Route,
    ) -> Result<UpstreamResponse, PipelineError> {
        let outcome =
            tokio::time::timeout(self.upstream_timeout, self.upstream.forward(request, route))
                .await;

        match outcome {
            Ok(Ok(response)) => {
                if response.is_server_error() {
                    self.circuit_breakers.record_failure(route.id());
                    record_upstream_failure(route.target_service());
                } else {
                    self.circuit_breakers.record_success(route.id());
                }
                Ok(response)
            }
            Ok(Err(err)) => {
                warn!(route_id = %route.id(), service = %route.target_service(), error = %err, "Upstream request failed");
                self.circuit_breakers.record_failure(route.id());
                record_upstream_failure(route.target_service());
                let message = match err {
                    DomainError::Upstream { message, .. } => message,
                    other => other.to_string(),
                };
                Err(PipelineError::upstream(message))
            }
            Err(_) => {
                warn!(route_id = %route.id(), service = %route.target_service(), "Upstream request timed out");
                self.circuit_breakers.record_failure(route.id());
                record_upstream_failure(route.target_service());
                Err(PipelineError::upstream(format!(
                    "Upstream request timed out after {} ms",
                    self.upstream_timeout.as_millis()
                )))
            }
        }
    }

    async fn log(&self, request: &GatewayRequest, trace: RequestTrace, response: &GatewayResponse) {
        let log = RequestLog {
            id: RequestLog::generate_id(),
            request_id: request.request_id.clone(),
            route_id: trace
                .route_id
                .unwrap_or_else(|| UNMATCHED_ROUTE.to_string()),
            method: request.method,
            path: request.path.clone(),
            status_code: response.status,
            duration_ms: response.duration_ms,
            client_ip: request.client_ip.clone(),
            user_id: request.user_id.clone(),
            api_key_id: trace.api_key_id,
            user_agent: request.user_agent().map(str::to_string),
            referer: request.referer().map(str::to_string),
            error: trace.error,
            cached: response.cached,
            rate_limited: trace.rate_limited,
            timestamp: Utc::now(),
        };

        self.request_logs.record(log).await;
    }
}

/// Counter scope and identity for a route's key-generation mode, falling back
/// to the client IP
fn rate_limit_identity<'a>(
    request: &'a GatewayRequest,
    route: &Route,
    api_key_id: Option<&'a str>,
) -> (&'static str, &'a str) {
    let identity = match route.rate_limit().key_generator {
        RateLimitKey::Ip | RateLimitKey::Custom => None,
        RateLimitKey::User => request.user_id.as_deref().map(|id| ("user", id)),
        RateLimitKey::ApiKey => api_key_id.map(|id| ("key", id)),
    };

    identity.unwrap_or(("ip", request.client_ip.as_str()))
}

fn validate(request: &GatewayRequest, route: &Route) -> Result<(), PipelineError> {
    let validation = route.validation();
    if !validation.enabled {
        return Ok(());
    }

    for header in &validation.required_headers {
        if request.header(header).is_none() {
            return Err(PipelineError::validation(format!(
                "Missing required header: {}",
                header
            )));
        }
    }

    if !validation.required_params.is_empty() {
        let path_params = matcher::extract_params(route.path(), &request.path).unwrap_or_default();
        for param in &validation.required_params {
            if !request.query.contains_key(param) && !path_params.contains_key(param) {
                return Err(PipelineError::validation(format!(
                    "Missing required parameter: {}",
                    param
                )));
            }
        }
    }

    if validation
        .max_body_size
        .is_some_and(|max| request.body_size() > max)
    {
        return Err(PipelineError::validation("Request body too large"));
    }

    Ok(())
}

fn transform_request(request: &mut GatewayRequest, route: &Route) {
    let transform = route.transform();

    for (name, value) in &transform.request_headers {
        request.set_header(name, value.clone());
    }
    for name in &transform.strip_headers {
        request.remove_header(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::route::{RateLimitConfig, RouteId};

    fn route_keyed_by(key_generator: RateLimitKey) -> Route {
        Route::new(RouteId::generate(), "Orders", "/orders", vec![HttpMethod::Get], "orders")
            .with_rate_limit(RateLimitConfig {
                enabled: true,
                strategy: Default::default(),
                requests: 10,
                window_ms: 60_000,
                key_generator,
                burst_limit: None,
            })
    }

    #[test]
    fn test_identity_is_scoped_by_mode() {
        let mut request = GatewayRequest::new(HttpMethod::Get, "/orders").with_client_ip("10.0.0.1");
        request.user_id = Some("10.0.0.1".to_string());

        let by_ip = rate_limit_identity(&request, &route_keyed_by(RateLimitKey::Ip), None);
        let by_user = rate_limit_identity(&request, &route_keyed_by(RateLimitKey::User), None);
        let by_key =
            rate_limit_identity(&request, &route_keyed_by(RateLimitKey::ApiKey), Some("10.0.0.1"));

        assert_eq!(by_ip, ("ip", "10.0.0.1"));
        assert_eq!(by_user, ("user", "10.0.0.1"));
        assert_eq!(by_key, ("key", "10.0.0.1"));
    }

    #[test]
    fn test_missing_identity_falls_back_to_ip() {
        let request = GatewayRequest::new(HttpMethod::Get, "/orders").with_client_ip("10.0.0.2");

        let by_user = rate_limit_identity(&request, &route_keyed_by(RateLimitKey::User), None);
        let by_key = rate_limit_identity(&request, &route_keyed_by(RateLimitKey::ApiKey), None);

        assert_eq!(by_user, ("ip", "10.0.0.2"));
        assert_eq!(by_key, ("ip", "10.0.0.2"));
    }
}
