use axum::{middleware, routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::admin;
use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::proxy;
use super::state::AppState;

/// Probes, the admin API and the proxy fallback for everything else
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::health_check))
        .route("/readyz", get(health::ready_check))
        .route("/livez", get(health::live_check))
        .nest("/admin", admin::create_admin_router())
        .fallback(proxy::proxy_handler)
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const ADMIN_TOKEN: &str = "test-admin-token";

    async fn app() -> Router {
        let mut config = AppConfig::default();
        config.auth.admin_token = Some(ADMIN_TOKEN.to_string());

        let state = crate::create_app_state(&config).await.unwrap();
        create_router(state)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn admin_get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let response = app()
            .await
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .uri("/livez")
                    .header("x-request-id", "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers().get("x-request-id").unwrap(), "req-123");
    }

    #[tokio::test]
    async fn test_admin_requires_credentials() {
        let response = app()
            .await
            .oneshot(Request::builder().uri("/admin/routes").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_lists_seeded_routes() {
        let response = app().await.oneshot(admin_get("/admin/routes")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total"], 2);
    }

    #[tokio::test]
    async fn test_unmatched_path_falls_through_to_gateway() {
        let response = app()
            .await
            .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Route not found");
        assert_eq!(body["status_code"], 404);
    }

    #[tokio::test]
    async fn test_created_route_is_reachable_through_proxy() {
        let app = app().await;

        let create = Request::builder()
            .method("POST")
            .uri("/admin/routes")
            .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({
                    "name": "Orders",
                    "path": "/orders/:id",
                    "methods": ["GET"],
                    "target_service": "orders"
                })
                .to_string(),
            ))
            .unwrap();
        let response = app.clone().oneshot(create).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        // Matched, but the target service was never registered
        let response = app
            .oneshot(Request::builder().uri("/orders/7").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Service 'orders' not registered");
    }
}
