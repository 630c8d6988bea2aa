use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid ID format: {message}")]
    InvalidId { message: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },

    #[error("Duplicate route: {message}")]
    DuplicateRoute { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Upstream error: {service} - {message}")]
    Upstream { service: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::InvalidId {
            message: message.into(),
        }
    }

    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::InvalidPath {
            message: message.into(),
        }
    }

    pub fn duplicate_route(message: impl Into<String>) -> Self {
        Self::DuplicateRoute {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Route 'route_1' not found");
        assert_eq!(error.to_string(), "Not found: Route 'route_1' not found");
    }

    #[test]
    fn test_duplicate_route_error() {
        let error = DomainError::duplicate_route("GET /api/test already registered");
        assert_eq!(
            error.to_string(),
            "Duplicate route: GET /api/test already registered"
        );
    }

    #[test]
    fn test_invalid_path_error() {
        let error = DomainError::invalid_path("Path must start with '/'");
        assert_eq!(error.to_string(), "Invalid path: Path must start with '/'");
    }

    #[test]
    fn test_upstream_error() {
        let error = DomainError::upstream("users", "connection refused");
        assert_eq!(error.to_string(), "Upstream error: users - connection refused");
    }
}
