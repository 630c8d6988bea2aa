//! Upstream services: registry and HTTP forwarding

mod http;
mod registry;

pub use http::HttpUpstream;
pub use registry::ServiceRegistry;
