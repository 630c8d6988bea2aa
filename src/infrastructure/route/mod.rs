//! Route table infrastructure

mod defaults;
mod repository;
mod service;

pub use defaults::{default_routes, CORE_SERVICE, SYSTEM_TAG};
pub use repository::InMemoryRouteRepository;
pub use service::RouteService;
