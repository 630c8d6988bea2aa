//! API layer - admin endpoints, probes and the proxy fallback

pub mod admin;
pub mod health;
pub mod middleware;
pub mod proxy;
pub mod router;
pub mod state;
pub mod types;

pub use middleware::RequireAdmin;
pub use router::create_router;
pub use state::AppState;
