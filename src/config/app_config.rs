use serde::Deserialize;

use crate::domain::route::CircuitBreakerSettings;
use crate::infrastructure::observability::ObservabilityConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest inbound request body read by the data plane
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Gateway core tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Request logs retained before the oldest are discarded
    pub request_log_capacity: usize,
    pub upstream_timeout_ms: u64,
    pub api_key_prefix: String,
    /// Register the built-in /health and /info routes on startup
    pub seed_default_routes: bool,
    pub rate_limit_sweep_interval_secs: u64,
    pub cache_max_capacity: u64,
    /// Breaker thresholds for routes that don't specify their own
    pub circuit_breaker: CircuitBreakerSettings,
    /// Upstream services registered on startup
    pub services: Vec<ServiceDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AuthSettings {
    /// Bearer token accepted on the admin surface
    pub admin_token: Option<String>,
    /// HS256 secret; when set, JWT routes verify signatures
    pub jwt_secret: Option<String>,
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            request_log_capacity: 10_000,
            upstream_timeout_ms: 30_000,
            api_key_prefix: "gk_".to_string(),
            seed_default_routes: true,
            rate_limit_sweep_interval_secs: 300,
            cache_max_capacity: 10_000,
            circuit_breaker: CircuitBreakerSettings::default(),
            services: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.gateway.request_log_capacity, 10_000);
        assert_eq!(config.gateway.upstream_timeout_ms, 30_000);
        assert_eq!(config.gateway.api_key_prefix, "gk_");
        assert_eq!(config.gateway.circuit_breaker.failure_threshold, 5);
        assert!(config.gateway.seed_default_routes);
        assert!(config.auth.admin_token.is_none());
    }

    #[test]
    fn test_partial_gateway_section_uses_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"upstream_timeout_ms": 500}"#).unwrap();

        assert_eq!(config.upstream_timeout_ms, 500);
        assert_eq!(config.request_log_capacity, 10_000);
        assert_eq!(config.circuit_breaker.success_threshold, 3);
    }

    #[test]
    fn test_log_format_lowercase() {
        let format: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert!(matches!(format, LogFormat::Json));
    }
}
