//! End-to-end gateway behavior over HTTP against a mock backend

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use pmp_api_gateway::api::create_router;
use pmp_api_gateway::config::ServiceDefinition;
use pmp_api_gateway::{create_app_state, AppConfig};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_string, header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ADMIN_TOKEN: &str = "scenario-admin-token";

struct TestGateway {
    app: Router,
    _backend: MockServer,
}

impl TestGateway {
    async fn start(backend: MockServer) -> Self {
        let mut config = AppConfig::default();
        config.auth.admin_token = Some(ADMIN_TOKEN.to_string());
        config.gateway.seed_default_routes = false;
        config.gateway.services = vec![ServiceDefinition {
            name: "backend".to_string(),
            url: backend.uri(),
        }];

        let state = create_app_state(&config).await.unwrap();
        Self {
            app: create_router(state),
            _backend: backend,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn admin(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN));

        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self.send(builder.body(body).unwrap()).await;
        let status = response.status();
        (status, json_body(response).await)
    }

    async fn create_route(&self, route: Value) -> String {
        let (status, body) = self.admin("POST", "/admin/routes", Some(route)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    async fn get_from(&self, uri: &str, ip: &str) -> Response {
        self.send(
            Request::builder()
                .uri(uri)
                .header("x-forwarded-for", ip)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

async fn backend_returning(route_path: &str, body: Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn disabled_route_returns_unavailable() {
    let gateway = TestGateway::start(backend_returning("/api/test", json!({"ok": true})).await).await;
    let route_id = gateway
        .create_route(json!({
            "name": "Test",
            "path": "/api/test",
            "methods": ["GET"],
            "target_service": "backend"
        }))
        .await;

    let response = gateway.get_from("/api/test", "10.0.0.1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-gateway-service").unwrap(), "backend");
    assert_eq!(json_body(response).await, json!({"ok": true}));

    let (status, route) = gateway
        .admin("POST", &format!("/admin/routes/{}/disable", route_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(route["status"], "DISABLED");

    let response = gateway.get_from("/api/test", "10.0.0.1").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn rate_limit_is_tracked_per_client_ip() {
    let gateway = TestGateway::start(backend_returning("/api/limited", json!({"ok": true})).await).await;
    gateway
        .create_route(json!({
            "name": "Limited",
            "path": "/api/limited",
            "methods": ["GET"],
            "target_service": "backend",
            "rate_limit": {"enabled": true, "requests": 3, "window_ms": 60000}
        }))
        .await;

    for remaining in ["2", "1", "0"] {
        let response = gateway.get_from("/api/limited", "203.0.113.7").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-ratelimit-remaining").unwrap(), remaining);
    }

    let response = gateway.get_from("/api/limited", "203.0.113.7").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
    assert_eq!(response.headers().get("x-ratelimit-limit").unwrap(), "3");

    let response = gateway.get_from("/api/limited", "198.51.100.4").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn cached_response_is_served_without_calling_upstream() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/cached"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": 42})))
        .expect(1)
        .mount(&backend)
        .await;

    let gateway = TestGateway::start(backend).await;
    gateway
        .create_route(json!({
            "name": "Cached",
            "path": "/api/cached",
            "methods": ["GET"],
            "target_service": "backend",
            "cache": {"enabled": true, "ttl_ms": 60000}
        }))
        .await;

    let first = gateway.get_from("/api/cached", "10.0.0.1").await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers().get("x-gateway-cached").unwrap(), "false");
    assert_eq!(first.headers().get("x-cache").unwrap(), "MISS");

    let second = gateway.get_from("/api/cached", "10.0.0.1").await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers().get("x-gateway-cached").unwrap(), "true");
    assert_eq!(second.headers().get("x-cache").unwrap(), "HIT");
    assert_eq!(json_body(second).await, json!({"value": 42}));

    let (status, body) = gateway.admin("DELETE", "/admin/cache", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["invalidated"], 1);
}

#[tokio::test]
async fn api_key_route_rejects_missing_and_revoked_keys() {
    let gateway = TestGateway::start(backend_returning("/api/secure", json!({"ok": true})).await).await;
    gateway
        .create_route(json!({
            "name": "Secure",
            "path": "/api/secure",
            "methods": ["GET"],
            "target_service": "backend",
            "auth": {"type": "API_KEY", "required": true}
        }))
        .await;

    let response = gateway.get_from("/api/secure", "10.0.0.1").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "API key required");

    let (status, issued) = gateway
        .admin(
            "POST",
            "/admin/api-keys",
            Some(json!({"name": "client", "organization_id": "org-1", "user_id": "user-1"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let secret = issued["key"].as_str().unwrap().to_string();
    let key_id = issued["id"].as_str().unwrap().to_string();

    let with_key = || {
        Request::builder()
            .uri("/api/secure")
            .header("x-api-key", secret.as_str())
            .body(Body::empty())
            .unwrap()
    };

    let response = gateway.send(with_key()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = gateway
        .admin("POST", &format!("/admin/api-keys/{}/revoke", key_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let response = gateway.send(with_key()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn path_parameters_and_request_logs() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders/17"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 17})))
        .mount(&backend)
        .await;

    let gateway = TestGateway::start(backend).await;
    gateway
        .create_route(json!({
            "name": "Orders",
            "path": "/orders/:id",
            "methods": ["GET"],
            "target_service": "backend"
        }))
        .await;

    let response = gateway.get_from("/orders/17", "10.0.0.9").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = gateway.get_from("/missing", "10.0.0.9").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let (status, logs) = gateway.admin("GET", "/admin/logs?limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs["retained"], 2);

    let (status, stats) = gateway.admin("GET", "/admin/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_requests"], 2);
}

#[tokio::test]
async fn upstream_errors_open_the_circuit() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&backend)
        .await;

    let gateway = TestGateway::start(backend).await;
    let route_id = gateway
        .create_route(json!({
            "name": "Flaky",
            "path": "/api/flaky",
            "methods": ["GET"],
            "target_service": "backend",
            "circuit_breaker": {"failure_threshold": 2, "success_threshold": 1, "timeout_ms": 60000}
        }))
        .await;

    for _ in 0..2 {
        let response = gateway.get_from("/api/flaky", "10.0.0.1").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    let response = gateway.get_from("/api/flaky", "10.0.0.1").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let (status, breaker) = gateway
        .admin("POST", &format!("/admin/circuit-breakers/{}/reset", route_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(breaker["state"], "CLOSED");
}

#[tokio::test]
async fn form_post_reaches_backend_unchanged() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/forms"))
        .and(header_matcher("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("a=1&b=2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"received": true})))
        .expect(1)
        .mount(&backend)
        .await;

    let gateway = TestGateway::start(backend).await;
    gateway
        .create_route(json!({
            "name": "Forms",
            "path": "/api/forms",
            "methods": ["POST"],
            "target_service": "backend"
        }))
        .await;

    let response = gateway
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/forms")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("a=1&b=2"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"received": true}));
}
