//! API Key infrastructure implementations
//!
//! Key generation, in-memory storage and the service that issues,
//! rotates, revokes and authenticates keys.

mod generator;
mod repository;
mod service;

pub use generator::{constant_time_compare, hash_key, verify_key, ApiKeyGenerator, GeneratedApiKey};
pub use repository::InMemoryApiKeyRepository;
pub use service::{ApiKeyAuthError, ApiKeyService, IssueApiKeyRequest, IssuedApiKey};
