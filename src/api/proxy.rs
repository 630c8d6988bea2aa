//! Data plane: every request outside the admin and probe routes
//!
//! Converts the axum request into a [`GatewayRequest`], runs the pipeline and
//! renders the [`GatewayResponse`] back to HTTP.

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::{
    body::{self, Body},
    extract::{ConnectInfo, Query, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::debug;

use super::state::AppState;
use crate::domain::gateway::{GatewayRequest, GatewayResponse};
use crate::domain::route::HttpMethod;

pub const DURATION_HEADER: &str = "x-gateway-duration-ms";
pub const CACHED_HEADER: &str = "x-gateway-cached";
pub const SERVICE_HEADER: &str = "x-gateway-service";

pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let gateway_request = match into_gateway_request(request, state.max_body_bytes).await {
        Ok(request) => request,
        Err(response) => return render(response),
    };

    let response = state.gateway.handle_request(gateway_request).await;
    render(response)
}

async fn into_gateway_request(
    request: Request,
    max_body_bytes: usize,
) -> Result<GatewayRequest, GatewayResponse> {
    let (parts, body) = request.into_parts();

    let method: HttpMethod = parts
        .method
        .as_str()
        .parse()
        .map_err(|_| GatewayResponse::error(405, "Method not allowed"))?;

    let connect_ip = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    let mut gateway_request = GatewayRequest::new(method, parts.uri.path())
        .with_client_ip(client_ip(&parts.headers, connect_ip));

    if let Some(request_id) = parts
        .headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
    {
        gateway_request = gateway_request.with_request_id(request_id);
    }

    if let Ok(Query(query)) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri) {
        gateway_request.query = query;
    }

    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            gateway_request.set_header(name.as_str(), value);
        }
    }

    let bytes = body::to_bytes(body, max_body_bytes)
        .await
        .map_err(|_| GatewayResponse::error(413, "Request body too large"))?;

    if !bytes.is_empty() {
        gateway_request = gateway_request.with_raw_body(bytes);
    }

    debug!(request_id = %gateway_request.request_id, method = %method, path = %gateway_request.path, "Proxying request");
    Ok(gateway_request)
}

/// First `X-Forwarded-For` entry, then `X-Real-IP`, then the socket peer
pub fn client_ip(headers: &HeaderMap, connect_ip: Option<String>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .or_else(|| header("x-real-ip").map(str::to_string))
        .or(connect_ip)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Render a pipeline response; bodies are JSON unless the upstream sent text
pub fn render(response: GatewayResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut headers = HeaderMap::new();
    for (name, value) in &response.headers {
        if name.eq_ignore_ascii_case("content-length") || name.eq_ignore_ascii_case("transfer-encoding") {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            headers.insert(name, value);
        }
    }

    headers.insert(
        HeaderName::from_static(DURATION_HEADER),
        HeaderValue::from(response.duration_ms),
    );
    headers.insert(
        HeaderName::from_static(CACHED_HEADER),
        HeaderValue::from_static(if response.cached { "true" } else { "false" }),
    );
    if let Some(service) = response
        .from_service
        .as_deref()
        .and_then(|s| HeaderValue::try_from(s).ok())
    {
        headers.insert(HeaderName::from_static(SERVICE_HEADER), service);
    }

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_none_or(|ct| ct.contains("json"));

    let body = match response.body {
        Value::Null => Body::empty(),
        Value::String(text) if !is_json => Body::from(text),
        value => {
            headers
                .entry(header::CONTENT_TYPE)
                .or_insert(HeaderValue::from_static("application/json"));
            Body::from(value.to_string())
        }
    };

    (status, headers, body).into_response()
}
