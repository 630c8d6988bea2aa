//! In-memory route repository

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::route::{HttpMethod, Route, RouteId, RouteRepository};
use crate::domain::DomainError;

/// Routes kept in registration order; lookups return the first match
#[derive(Debug, Default)]
pub struct InMemoryRouteRepository {
    routes: RwLock<Vec<Route>>,
}

impl InMemoryRouteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RouteRepository for InMemoryRouteRepository {
    async fn get(&self, id: &RouteId) -> Result<Option<Route>, DomainError> {
        let routes = self.routes.read().await;
        Ok(routes.iter().find(|r| r.id() == id).cloned())
    }

    async fn find_by_path(
        &self,
        path: &str,
        methods: &[HttpMethod],
    ) -> Result<Option<Route>, DomainError> {
        let routes = self.routes.read().await;
        Ok(routes.iter().find(|r| r.matches(path, methods)).cloned())
    }

    async fn create(&self, route: Route) -> Result<Route, DomainError> {
        let mut routes = self.routes.write().await;

        if routes.iter().any(|r| r.id() == route.id()) {
            return Err(DomainError::conflict(format!(
                "Route with ID '{}' already exists",
                route.id()
            )));
        }

        if let Some(existing) = routes.iter().find(|r| r.overlaps(&route)) {
            return Err(DomainError::duplicate_route(format!(
                "{} {:?} overlaps route '{}' ({})",
                route.path(),
                route.methods(),
                existing.id(),
                existing.path()
            )));
        }

        routes.push(route.clone());
        Ok(route)
    }

    async fn update(&self, route: &Route) -> Result<Route, DomainError> {
        let mut routes = self.routes.write().await;

        let existing = routes
            .iter_mut()
            .find(|r| r.id() == route.id())
            .ok_or_else(|| DomainError::not_found(format!("Route '{}' not found", route.id())))?;
        *existing = route.clone();

        Ok(route.clone())
    }

    async fn delete(&self, id: &RouteId) -> Result<bool, DomainError> {
        let mut routes = self.routes.write().await;
        let before = routes.len();
        routes.retain(|r| r.id() != id);
        Ok(routes.len() < before)
    }

    async fn list(&self) -> Result<Vec<Route>, DomainError> {
        Ok(self.routes.read().await.clone())
    }
}
