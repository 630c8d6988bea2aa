//! API Key domain
//!
//! Domain types and the repository seam for gateway API keys.

mod entity;
mod repository;

pub use entity::{ApiKey, ApiKeyId, ApiKeyRateLimit, ApiKeyStatus, ADMIN_PERMISSION};
pub use repository::ApiKeyRepository;
