//! Route service - route table management
//!
//! Every route owns exactly one circuit breaker; the two are created,
//! reconfigured and removed together.

use std::sync::Arc;

use tracing::{debug, info};

use super::defaults::default_routes;
use crate::domain::events::{EventPublisher, GatewayEvent};
use crate::domain::route::{
    validate_path, validate_route, CircuitBreakerSettings, HttpMethod, Route, RouteId,
    RouteRepository, RouteStatus, RouteUpdate,
};
use crate::domain::DomainError;
use crate::infrastructure::circuit_breaker::CircuitBreakerRegistry;

#[derive(Debug)]
pub struct RouteService {
    repository: Arc<dyn RouteRepository>,
    breakers: Arc<CircuitBreakerRegistry>,
    events: Arc<dyn EventPublisher>,
    default_circuit_breaker: CircuitBreakerSettings,
}

impl RouteService {
    pub fn new(
        repository: Arc<dyn RouteRepository>,
        breakers: Arc<CircuitBreakerRegistry>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            breakers,
            events,
            default_circuit_breaker: CircuitBreakerSettings::default(),
        }
    }

    pub fn with_default_circuit_breaker(mut self, settings: CircuitBreakerSettings) -> Self {
        self.default_circuit_breaker = settings;
        self
    }

    /// Breaker thresholds for routes registered without their own
    pub fn default_circuit_breaker(&self) -> CircuitBreakerSettings {
        self.default_circuit_breaker
    }

    pub async fn register(&self, route: Route) -> Result<Route, DomainError> {
        validate_route(&route)?;

        info!(
            "Registering route: id={}, path={}, methods={:?}",
            route.id(),
            route.path(),
            route.methods()
        );

        let created = self.repository.create(route).await?;
        self.breakers
            .create(created.id(), *created.circuit_breaker());

        self.events.publish(GatewayEvent::RouteCreated {
            route_id: created.id().to_string(),
            path: created.path().to_string(),
        });

        Ok(created)
    }

    /// Merge a partial update; path uniqueness is not re-checked
    pub async fn update(&self, id: &RouteId, update: RouteUpdate) -> Result<Route, DomainError> {
        info!("Updating route: id={}", id);

        if let Some(path) = &update.path {
            validate_path(path)?;
        }

        let mut route = self.require(id).await?;
        let breaker_settings = update.circuit_breaker;
        route.apply(update);
        validate_route(&route)?;

        let updated = self.repository.update(&route).await?;

        if let Some(settings) = breaker_settings {
            self.breakers.reconfigure(id, settings);
        }

        self.events.publish(GatewayEvent::RouteUpdated {
            route_id: id.to_string(),
        });

        Ok(updated)
    }

    pub async fn delete(&self, id: &RouteId) -> Result<(), DomainError> {
        info!("Deleting route: id={}", id);

        if !self.repository.delete(id).await? {
            return Err(DomainError::not_found(format!("Route '{}' not found", id)));
        }

        self.breakers.remove(id);
        self.events.publish(GatewayEvent::RouteDeleted {
            route_id: id.to_string(),
        });

        Ok(())
    }

    pub async fn get(&self, id: &RouteId) -> Result<Option<Route>, DomainError> {
        self.repository.get(id).await
    }

    pub async fn find_by_path(
        &self,
        path: &str,
        methods: &[HttpMethod],
    ) -> Result<Option<Route>, DomainError> {
        let route = self.repository.find_by_path(path, methods).await?;
        debug!(path = %path, matched = ?route.as_ref().map(|r| r.id().to_string()), "Route lookup");
        Ok(route)
    }

    pub async fn list(&self, include_disabled: bool) -> Result<Vec<Route>, DomainError> {
        let routes = self.repository.list().await?;

        Ok(routes
            .into_iter()
            .filter(|r| include_disabled || r.status() != RouteStatus::Disabled)
            .collect())
    }

    pub async fn list_by_tag(&self, tag: &str) -> Result<Vec<Route>, DomainError> {
        let routes = self.repository.list().await?;
        Ok(routes.into_iter().filter(|r| r.has_tag(tag)).collect())
    }

    pub async fn enable(&self, id: &RouteId) -> Result<Route, DomainError> {
        self.update(id, RouteUpdate::status(RouteStatus::Active))
            .await
    }

    pub async fn disable(&self, id: &RouteId) -> Result<Route, DomainError> {
        self.update(id, RouteUpdate::status(RouteStatus::Disabled))
            .await
    }

    pub async fn deprecate(&self, id: &RouteId) -> Result<Route, DomainError> {
        self.update(id, RouteUpdate::status(RouteStatus::Deprecated))
            .await
    }

    pub async fn maintenance(&self, id: &RouteId) -> Result<Route, DomainError> {
        self.update(id, RouteUpdate::status(RouteStatus::Maintenance))
            .await
    }

    /// Register the built-in system routes
    pub async fn seed_defaults(&self) -> Result<Vec<Route>, DomainError> {
        let mut seeded = Vec::new();
        for route in default_routes() {
            let route = route.with_circuit_breaker(self.default_circuit_breaker);
            seeded.push(self.register(route).await?);
        }

        info!("Seeded {} default routes", seeded.len());
        Ok(seeded)
    }

    async fn require(&self, id: &RouteId) -> Result<Route, DomainError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Route '{}' not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::circuit_breaker::CircuitState;
    use crate::infrastructure::events::BroadcastEventPublisher;
    use crate::infrastructure::route::InMemoryRouteRepository;

    struct Fixture {
        service: RouteService,
        breakers: Arc<CircuitBreakerRegistry>,
        events: BroadcastEventPublisher,
    }

    fn fixture() -> Fixture {
        let events = BroadcastEventPublisher::default();
        let publisher: Arc<dyn EventPublisher> = Arc::new(events.clone());
        let breakers = Arc::new(CircuitBreakerRegistry::new(publisher.clone()));
        let service = RouteService::new(
            Arc::new(InMemoryRouteRepository::new()),
            breakers.clone(),
            publisher,
        );

        Fixture {
            service,
            breakers,
            events,
        }
    }

    fn route(path: &str) -> Route {
        Route::new(
            RouteId::generate(),
            "Orders",
            path,
            vec![HttpMethod::Get],
            "orders",
        )
    }

    #[tokio::test]
    async fn test_register_allocates_breaker_and_publishes() {
        let f = fixture();
        let mut receiver = f.events.subscribe();

        let created = f.service.register(route("/orders/:id")).await.unwrap();

        let breaker = f.breakers.get(created.id()).unwrap();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(receiver.recv().await.unwrap().event.name(), "route.created");
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_path() {
        let f = fixture();
        let result = f.service.register(route("orders")).await;
        assert!(matches!(result, Err(DomainError::InvalidPath { .. })));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate() {
        let f = fixture();
        f.service.register(route("/orders/:id")).await.unwrap();

        let result = f.service.register(route("/orders/:order")).await;
        assert!(matches!(result, Err(DomainError::DuplicateRoute { .. })));
        assert_eq!(f.breakers.len(), 1);
    }

    #[tokio::test]
    async fn test_update_merges_and_reconfigures_breaker() {
        let f = fixture();
        let created = f.service.register(route("/orders")).await.unwrap();

        let settings = CircuitBreakerSettings {
            failure_threshold: 2,
            success_threshold: 1,
            timeout_ms: 5_000,
        };
        let updated = f
            .service
            .update(
                created.id(),
                RouteUpdate {
                    name: Some("Renamed".to_string()),
                    circuit_breaker: Some(settings),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name(), "Renamed");
        assert_eq!(updated.path(), "/orders");
        assert!(updated.updated_at() >= created.updated_at());
        assert_eq!(f.breakers.get(created.id()).unwrap().settings(), settings);
    }

    #[tokio::test]
    async fn test_update_missing_route() {
        let f = fixture();
        let result = f
            .service
            .update(&RouteId::new("route_missing").unwrap(), RouteUpdate::default())
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_removes_breaker() {
        let f = fixture();
        let created = f.service.register(route("/orders")).await.unwrap();

        f.service.delete(created.id()).await.unwrap();

        assert!(f.breakers.get(created.id()).is_none());
        assert!(f.service.get(created.id()).await.unwrap().is_none());
        assert!(matches!(
            f.service.delete(created.id()).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_status_transitions_and_listing() {
        let f = fixture();
        let a = f.service.register(route("/a")).await.unwrap();
        f.service.register(route("/b")).await.unwrap();

        let disabled = f.service.disable(a.id()).await.unwrap();
        assert_eq!(disabled.status(), RouteStatus::Disabled);
        assert_eq!(f.service.list(false).await.unwrap().len(), 1);
        assert_eq!(f.service.list(true).await.unwrap().len(), 2);

        assert_eq!(
            f.service.maintenance(a.id()).await.unwrap().status(),
            RouteStatus::Maintenance
        );
        assert_eq!(
            f.service.deprecate(a.id()).await.unwrap().status(),
            RouteStatus::Deprecated
        );
        assert_eq!(
            f.service.enable(a.id()).await.unwrap().status(),
            RouteStatus::Active
        );
    }

    #[tokio::test]
    async fn test_seed_defaults_and_list_by_tag() {
        let f = fixture();
        f.service.seed_defaults().await.unwrap();
        f.service.register(route("/orders")).await.unwrap();

        let system = f.service.list_by_tag("system").await.unwrap();
        assert_eq!(system.len(), 2);
        assert!(f
            .service
            .find_by_path("/health", &[HttpMethod::Get])
            .await
            .unwrap()
            .is_some());
    }
}
