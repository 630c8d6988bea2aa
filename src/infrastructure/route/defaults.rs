//! Built-in routes registered on startup

use crate::domain::route::{CacheConfig, HttpMethod, RateLimitConfig, Route, RouteId};

/// Service the built-in routes forward to
pub const CORE_SERVICE: &str = "core";
pub const SYSTEM_TAG: &str = "system";

pub fn default_routes() -> Vec<Route> {
    vec![
        Route::new(
            RouteId::generate(),
            "Health Check",
            "/health",
            vec![HttpMethod::Get],
            CORE_SERVICE,
        )
        .with_description("Gateway health check")
        .with_target_path("/health")
        .with_cache(CacheConfig::public(30_000))
        .with_rate_limit(RateLimitConfig::fixed_window(100, 60_000))
        .with_tags([SYSTEM_TAG]),
        Route::new(
            RouteId::generate(),
            "System Info",
            "/info",
            vec![HttpMethod::Get],
            CORE_SERVICE,
        )
        .with_description("System information")
        .with_target_path("/info")
        .with_cache(CacheConfig::public(300_000))
        .with_rate_limit(RateLimitConfig::fixed_window(50, 60_000))
        .with_tags([SYSTEM_TAG]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::route::validate_route;

    #[test]
    fn test_default_routes_are_valid_and_disjoint() {
        let routes = default_routes();

        assert_eq!(routes.len(), 2);
        for route in &routes {
            validate_route(route).unwrap();
            assert!(route.has_tag(SYSTEM_TAG));
            assert_eq!(route.target_service(), CORE_SERVICE);
        }
        assert!(!routes[0].overlaps(&routes[1]));
    }

    #[test]
    fn test_default_route_policies() {
        let routes = default_routes();
        let health = &routes[0];

        assert_eq!(health.path(), "/health");
        assert_eq!(health.cache().ttl_ms, 30_000);
        assert_eq!(health.rate_limit().requests, 100);
        assert_eq!(routes[1].cache().ttl_ms, 300_000);
        assert_eq!(routes[1].rate_limit().requests, 50);
    }
}
