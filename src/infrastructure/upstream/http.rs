//! HTTP upstream using reqwest

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use super::registry::ServiceRegistry;
use crate::domain::gateway::GatewayRequest;
use crate::domain::route::{HttpMethod, Route};
use crate::domain::upstream::{Upstream, UpstreamResponse};
use crate::domain::DomainError;

/// Headers that describe a single connection and are never forwarded
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}

/// Forwards requests to `<service url><target path>`
///
/// Timeouts are enforced by the caller.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    services: Arc<ServiceRegistry>,
}

impl HttpUpstream {
    pub fn new(services: Arc<ServiceRegistry>) -> Self {
        Self {
            client: reqwest::Client::new(),
            services,
        }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn forward(
        &self,
        request: &GatewayRequest,
        route: &Route,
    ) -> Result<UpstreamResponse, DomainError> {
        let service_name = route.target_service();
        let service = self.services.get(service_name).ok_or_else(|| {
            DomainError::upstream(
                service_name,
                format!("Service '{}' not registered", service_name),
            )
        })?;

        let url = format!(
            "{}{}",
            service.url.trim_end_matches('/'),
            route.upstream_path(&request.path)
        );
        debug!(service = %service_name, url = %url, method = %request.method, "Forwarding request");

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &url)
            .header("x-request-id", &request.request_id);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        for (name, value) in request.headers() {
            if !is_hop_by_hop(name) {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }

        match (&request.raw_body, &request.body) {
            (Some(raw), _) => builder = builder.body(raw.clone()),
            (None, Some(body)) => builder = builder.json(body),
            (None, None) => {}
        }

        let response = builder.send().await.map_err(|e| {
            self.services.set_health(service_name, false);
            DomainError::upstream(service_name, format!("Request failed: {}", e))
        })?;
        self.services.set_health(service_name, true);

        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let bytes = response.bytes().await.map_err(|e| {
            DomainError::upstream(service_name, format!("Failed to read response: {}", e))
        })?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}
