//! Domain layer: entities, value objects and the traits infrastructure implements

pub mod api_key;
pub mod cache;
pub mod circuit_breaker;
pub mod error;
pub mod events;
pub mod gateway;
pub mod route;
pub mod telemetry;
pub mod upstream;

pub use api_key::{ApiKey, ApiKeyId, ApiKeyRepository, ApiKeyStatus};
pub use cache::{CacheKey, CachedResponse, ResponseCache};
pub use circuit_breaker::{Admission, CircuitBreaker, CircuitState, CircuitTransition};
pub use error::DomainError;
pub use events::{EventEnvelope, EventPublisher, GatewayEvent};
pub use gateway::{GatewayRequest, GatewayResponse, PipelineError};
pub use route::{HttpMethod, Route, RouteId, RouteRepository, RouteStatus, RouteUpdate};
pub use telemetry::{GatewayStats, RequestLog};
pub use upstream::{ServiceEntry, Upstream, UpstreamResponse};
