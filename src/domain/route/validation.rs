//! Registration-time validation of route definitions

use super::entity::Route;
use super::policy::MAX_POLICY_DURATION_MS;
use crate::domain::DomainError;

/// Validate a path pattern
pub fn validate_path(path: &str) -> Result<(), DomainError> {
    if !path.starts_with('/') {
        return Err(DomainError::invalid_path(format!(
            "Path '{}' must start with '/'",
            path
        )));
    }

    if path.split('/').any(|segment| segment == ":") {
        return Err(DomainError::invalid_path(format!(
            "Path '{}' contains an unnamed parameter",
            path
        )));
    }

    Ok(())
}

/// Reject durations the clock arithmetic can't represent
pub fn validate_duration_ms(field: &str, value_ms: u64) -> Result<(), DomainError> {
    if value_ms > MAX_POLICY_DURATION_MS {
        return Err(DomainError::validation(format!(
            "{} must not exceed {} ms",
            field, MAX_POLICY_DURATION_MS
        )));
    }
    Ok(())
}

/// Validate a full route definition before it is stored
pub fn validate_route(route: &Route) -> Result<(), DomainError> {
    validate_path(route.path())?;

    if route.name().trim().is_empty() {
        return Err(DomainError::validation("Route name cannot be empty"));
    }

    if route.methods().is_empty() {
        return Err(DomainError::validation(
            "Route must allow at least one HTTP method",
        ));
    }

    if route.target_service().trim().is_empty() {
        return Err(DomainError::validation("Route target service cannot be empty"));
    }

    if let Some(target_path) = route.target_path() {
        validate_path(target_path)?;
    }

    let rate_limit = route.rate_limit();
    if rate_limit.enabled {
        if rate_limit.requests == 0 {
            return Err(DomainError::validation(
                "Rate limit requests must be greater than zero",
            ));
        }
        if rate_limit.window_ms == 0 {
            return Err(DomainError::validation(
                "Rate limit window must be greater than zero",
            ));
        }
        if rate_limit.burst_limit == Some(0) {
            return Err(DomainError::validation(
                "Rate limit burst must be greater than zero",
            ));
        }
        validate_duration_ms("Rate limit window", rate_limit.window_ms)?;
    }

    if route.cache().enabled {
        if route.cache().ttl_ms == 0 {
            return Err(DomainError::validation("Cache TTL must be greater than zero"));
        }
        validate_duration_ms("Cache TTL", route.cache().ttl_ms)?;
    }

    let breaker = route.circuit_breaker();
    if breaker.failure_threshold == 0 || breaker.success_threshold == 0 {
        return Err(DomainError::validation(
            "Circuit breaker thresholds must be greater than zero",
        ));
    }
    validate_duration_ms("Circuit breaker timeout", breaker.timeout_ms)?;

    Ok(())
}
