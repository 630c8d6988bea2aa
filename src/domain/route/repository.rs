//! Route repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{HttpMethod, Route, RouteId};
use crate::domain::DomainError;

/// Repository trait for the route table
///
/// Implementations keep routes in registration order; `find_by_path`
/// returns the first structural match in that order.
#[async_trait]
pub trait RouteRepository: Send + Sync + Debug {
    async fn get(&self, id: &RouteId) -> Result<Option<Route>, DomainError>;

    async fn find_by_path(
        &self,
        path: &str,
        methods: &[HttpMethod],
    ) -> Result<Option<Route>, DomainError>;

    /// Store a new route, failing with `DuplicateRoute` if it overlaps an existing one
    async fn create(&self, route: Route) -> Result<Route, DomainError>;

    /// Replace an existing route without re-checking uniqueness
    async fn update(&self, route: &Route) -> Result<Route, DomainError>;

    async fn delete(&self, id: &RouteId) -> Result<bool, DomainError>;

    async fn list(&self) -> Result<Vec<Route>, DomainError>;
}
