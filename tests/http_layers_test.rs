// Integration tests for the cross-cutting HTTP layers: health, fallback,
// rate limiting, CORS and security headers

use axum::http::StatusCode;
use serde_json::Value;

mod common;
use common::{setup_test_app, setup_test_app_with};

#[tokio::test]
async fn test_root_health() {
    let app = setup_test_app().await;

    let response = app.get("/").send().await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["message"], "OK");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = setup_test_app().await;
    let token = app.access_token().await;

    let response = app
        .get("/api/admin/dataManager/nothingHere")
        .bearer(&token)
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.error(),
        ("NotFound".to_string(), "Route not found!".to_string())
    );
}

#[tokio::test]
async fn test_rate_limit_per_client_address() {
    let app = setup_test_app_with(&[("RATE_LIMIT_MAX_REQUESTS", "3")]).await;

    for _ in 0..3 {
        let response = app.get("/").with_ip("10.0.0.1:4000").send().await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let limited = app.get("/").with_ip("10.0.0.1:4000").send().await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        limited.error(),
        (
            "TooManyRequests".to_string(),
            "Too many requests!".to_string()
        )
    );
    let retry_after: u64 = limited.header("retry-after").unwrap().parse().unwrap();
    assert!(retry_after >= 1);

    let other_client = app.get("/").with_ip("10.0.0.2:4000").send().await;
    assert_eq!(other_client.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_uses_forwarded_client_behind_proxy() {
    let app = setup_test_app_with(&[("RATE_LIMIT_MAX_REQUESTS", "1")]).await;

    // Same proxy address, different forwarded clients
    let first = app
        .get("/")
        .header("x-forwarded-for", "203.0.113.7")
        .send()
        .await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .get("/")
        .header("x-forwarded-for", "203.0.113.8")
        .send()
        .await;
    assert_eq!(second.status(), StatusCode::OK);

    let repeat = app
        .get("/")
        .header("x-forwarded-for", "203.0.113.7")
        .send()
        .await;
    assert_eq!(repeat.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_cors_preflight_for_whitelisted_origin() {
    let app = setup_test_app_with(&[("PRODUCTION_URL", "https://admin.example.com")]).await;

    let response = app
        .options("/api/admin/dataManager/adminPost")
        .header("origin", "https://admin.example.com")
        .header("access-control-request-method", "PATCH")
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.header("access-control-allow-origin").as_deref(),
        Some("https://admin.example.com")
    );
    assert_eq!(
        response.header("access-control-allow-credentials").as_deref(),
        Some("true")
    );
    assert!(response
        .header("access-control-allow-methods")
        .unwrap()
        .contains("PATCH"));

    let foreign = app
        .options("/api/admin/dataManager/adminPost")
        .header("origin", "https://evil.example")
        .send()
        .await;
    assert!(foreign.header("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_cors_headers_on_error_responses() {
    let app = setup_test_app_with(&[("PRODUCTION_URL", "https://admin.example.com")]).await;

    let response = app
        .get("/api/admin/dataManager/adminPost")
        .header("origin", "https://admin.example.com")
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.header("access-control-allow-origin").as_deref(),
        Some("https://admin.example.com")
    );
}

#[tokio::test]
async fn test_security_headers() {
    let app = setup_test_app().await;

    let response = app.get("/").send().await;
    assert_eq!(response.header("x-content-type-options").as_deref(), Some("nosniff"));
    assert_eq!(response.header("x-frame-options").as_deref(), Some("SAMEORIGIN"));
    assert_eq!(response.header("referrer-policy").as_deref(), Some("no-referrer"));
    assert!(response.header("strict-transport-security").is_none());

    let production = setup_test_app_with(&[
        ("ENVIRONMENT", "production"),
        ("PRODUCTION_URL", "https://admin.example.com"),
    ])
    .await;
    let response = production.get("/").send().await;
    assert!(response.header("strict-transport-security").is_some());
}
