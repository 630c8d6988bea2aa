//! Service registry: upstream name to base URL

use chrono::Utc;
use dashmap::DashMap;
use tracing::info;

use crate::domain::upstream::ServiceEntry;
use crate::domain::DomainError;

#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: DashMap<String, ServiceEntry>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a service
    pub fn register(
        &self,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<ServiceEntry, DomainError> {
        let name = name.into();
        let url = url.into();

        if name.trim().is_empty() {
            return Err(DomainError::validation("Service name cannot be empty"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(DomainError::validation(format!(
                "Service URL '{}' must start with http:// or https://",
                url
            )));
        }

        info!("Registering service: name={}, url={}", name, url);

        let entry = ServiceEntry::new(name.clone(), url);
        self.services.insert(name, entry.clone());
        Ok(entry)
    }

    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.services.remove(name).is_some();
        if removed {
            info!("Unregistered service: name={}", name);
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<ServiceEntry> {
        self.services.get(name).map(|s| s.clone())
    }

    /// Record the outcome of a health probe
    pub fn set_health(&self, name: &str, healthy: bool) -> bool {
        match self.services.get_mut(name) {
            Some(mut entry) => {
                entry.healthy = healthy;
                entry.last_check = Utc::now();
                true
            }
            None => false,
        }
    }

    /// All services, ordered by name
    pub fn list_all(&self) -> Vec<ServiceEntry> {
        let mut services: Vec<ServiceEntry> =
            self.services.iter().map(|s| s.value().clone()).collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        services
    }
}
