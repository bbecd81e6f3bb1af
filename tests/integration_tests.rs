//! End-to-end tests for the demo router.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot` and,
//! for the wire-level checks, served on an ephemeral port and queried with
//! `reqwest`.
//!
//! Run with: `cargo test --test integration_tests`
#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use helmet_pipeline::handlers::{GREETING, HealthResponse};
use helmet_pipeline::{AppState, Config, Helmet, HelmetOptions, build_router};
use serde_json::json;
use tokio::net::TcpListener;
use tower::ServiceExt;

fn demo_router() -> Router {
    let config = Config::default();
    let helmet = Helmet::new(&config.helmet_options().unwrap()).unwrap();
    build_router(AppState::new(helmet))
}

/// Serve `router` on 127.0.0.1 and return its base URL.
async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn test_dispatched_route_is_hardened() {
    let response = demo_router()
        .oneshot(Request::get("/anything").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(
        headers["content-security-policy"],
        "default-src 'self';script-src 'self' https://cdn.example.com"
    );
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert_eq!(headers["server"], "hp-helmet");
    assert!(!headers.contains_key("x-powered-by"));
    assert!(headers.contains_key("x-request-id"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body, GREETING);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let response = demo_router()
        .oneshot(
            Request::get("/")
                .header("x-request-id", "trace-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "trace-123");
}

#[tokio::test]
async fn test_health_route_shares_rule_set() {
    let response = demo_router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-frame-options"], "SAMEORIGIN");
    assert_eq!(response.headers()["server"], "hp-helmet");

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: HealthResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.active_rules, 13);
}

#[tokio::test]
async fn test_custom_options_over_the_wire() {
    let options = HelmetOptions::from_json_value(json!({
        "contentSecurityPolicy": false,
        "crossOriginEmbedderPolicy": true,
        "xPoweredBy": { "serverValue": null }
    }))
    .unwrap();
    let router = build_router(AppState::new(Helmet::new(&options).unwrap()));
    let base = spawn_server(router).await;

    let response = reqwest::get(format!("{base}/")).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let headers = response.headers();
    assert!(headers.get("content-security-policy").is_none());
    assert_eq!(headers["cross-origin-embedder-policy"], "require-corp");
    assert!(headers.get("x-powered-by").is_none());
    assert!(headers.get("server").is_none());

    assert_eq!(response.text().await.unwrap(), GREETING);
}

#[tokio::test]
async fn test_concurrent_clients() {
    let base = spawn_server(demo_router()).await;
    let client = reqwest::Client::new();

    let requests = (0..8).map(|i| {
        let client = client.clone();
        let url = format!("{base}/item/{i}");
        async move { client.get(url).send().await.unwrap() }
    });

    for response in futures_util::future::join_all(requests).await {
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    }
}
