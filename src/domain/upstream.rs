//! Upstream services the gateway forwards to

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::gateway::GatewayRequest;
use crate::domain::route::Route;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Response returned by an upstream service
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl UpstreamResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body,
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

/// Forwards a (transformed) request to the route's target service
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn forward(
        &self,
        request: &GatewayRequest,
        route: &Route,
    ) -> Result<UpstreamResponse, DomainError>;
}

/// Service registry entry
///
/// Health is informational; it does not gate forwarding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub url: String,
    pub healthy: bool,
    pub last_check: DateTime<Utc>,
}

impl ServiceEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            healthy: true,
            last_check: Utc::now(),
        }
    }
}
