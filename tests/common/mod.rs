// Common test utilities and helper structs
// Shared across all test files to avoid duplication

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::ConnectInfo,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use medadmin_backend::{
    app::AppState,
    build_router,
    services::{IpRateLimiter, JwtConfig, JwtService, RateLimitConfig},
    AppConfig, InMemoryStore, MemoryAssetHost,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tower::util::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "Str0ng-Passw0rd!";
const BOUNDARY: &str = "medadmin-test-boundary";

fn base_vars() -> HashMap<String, String> {
    [
        ("ENVIRONMENT", "test"),
        ("MONGO_CONNECTION_STRING", "mongodb://localhost:27017"),
        ("ACCESS_TOKEN_SECRET", "integration-access-secret-0123456789"),
        ("REFRESH_TOKEN_SECRET", "integration-refresh-secret-0123456789"),
        ("BCRYPT_COST", "4"),
        ("RATE_LIMIT_MAX_REQUESTS", "10000"),
        ("CLOUDINARY_CLOUD_NAME", "demo"),
        ("CLOUDINARY_API_KEY", "key"),
        ("CLOUDINARY_API_SECRET", "secret"),
        ("CLOUDFLARE_ACCOUNT_ID", "account"),
        ("CLOUDFLARE_API_KEY", "images-key"),
        ("CLOUDFLARE_STREAM_API_TOKEN", "stream-token"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub doctor_images: Arc<MemoryAssetHost>,
    pub post_media: Arc<MemoryAssetHost>,
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(&[]).await
}

/// Build the full router over in-memory stores, overriding config variables
pub async fn setup_test_app_with(overrides: &[(&str, &str)]) -> TestApp {
    let mut vars = base_vars();
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }
    let config = AppConfig::from_map(&vars).expect("valid test config");

    let store = Arc::new(InMemoryStore::new());
    let doctor_images = Arc::new(MemoryAssetHost::new());
    let post_media = Arc::new(MemoryAssetHost::new());

    let state = AppState {
        jwt_service: Arc::new(JwtService::new(JwtConfig::from_app_config(&config.jwt))),
        rate_limiter: Arc::new(
            IpRateLimiter::new(RateLimitConfig::from_security(&config.security))
                .expect("valid rate limit config"),
        ),
        config: Arc::new(config),
        admins: store.clone(),
        tokens: store.clone(),
        doctors: store.clone(),
        posts: store.clone(),
        doctor_images: doctor_images.clone(),
        post_media: post_media.clone(),
    };

    TestApp {
        app: build_router(state.clone()),
        state,
        store,
        doctor_images,
        post_media,
    }
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}{}@example.com", prefix, Uuid::new_v4().simple())
}

impl TestApp {
    pub fn get(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "GET", uri)
    }

    pub fn post(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "POST", uri)
    }

    pub fn put(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "PUT", uri)
    }

    pub fn patch(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "PATCH", uri)
    }

    pub fn delete(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "DELETE", uri)
    }

    pub fn options(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "OPTIONS", uri)
    }

    /// Register a fresh admin and log in; returns the access token and refresh cookie value
    pub async fn login_new_admin(&self) -> (String, String) {
        let email = unique_email("admin");
        let response = self
            .post("/api/admin/auth/registerAdmin")
            .json(&json!({ "email": email, "password": TEST_PASSWORD }))
            .send()
            .await;
        assert_eq!(response.status(), StatusCode::CREATED, "{}", response.text());

        let response = self
            .post("/api/admin/auth/login")
            .json(&json!({ "email": email, "password": TEST_PASSWORD }))
            .send()
            .await;
        assert_eq!(response.status(), StatusCode::OK, "{}", response.text());

        let refresh = response
            .cookie("refreshToken")
            .expect("login sets the refresh cookie");
        let body: serde_json::Value = response.json();
        let access = body["accessToken"]
            .as_str()
            .expect("login returns an access token")
            .to_string();
        (access, refresh)
    }

    pub async fn access_token(&self) -> String {
        self.login_new_admin().await.0
    }
}

/// Test request builder
pub struct TestRequest<'a> {
    app: &'a TestApp,
    method: String,
    uri: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    ip: String,
}

impl<'a> TestRequest<'a> {
    fn new(app: &'a TestApp, method: &str, uri: &str) -> Self {
        Self {
            app,
            method: method.to_string(),
            uri: uri.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
            ip: "127.0.0.1:12345".to_string(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("authorization", &format!("Bearer {}", token))
    }

    pub fn cookie(self, name: &str, value: &str) -> Self {
        self.header("cookie", &format!("{}={}", name, value))
    }

    /// Add JSON body to request
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        self.body = serde_json::to_vec(body).unwrap();
        self.header("content-type", "application/json")
    }

    pub fn raw_body(mut self, content_type: &str, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self.header("content-type", content_type)
    }

    pub fn multipart(mut self, form: MultipartBody) -> Self {
        self.body = form.finish();
        self.header(
            "content-type",
            &format!("multipart/form-data; boundary={}", BOUNDARY),
        )
    }

    /// Set the socket address the request appears to come from
    pub fn with_ip(mut self, addr: &str) -> Self {
        self.ip = addr.to_string();
        self
    }

    /// Send the request
    pub async fn send(self) -> TestResponse {
        let mut builder = Request::builder().method(self.method.as_str()).uri(&self.uri);
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }
        let mut request = builder.body(Body::from(self.body)).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(self.ip.parse::<SocketAddr>().unwrap()));

        let response = self.app.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Test response wrapper
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("invalid JSON body ({}): {}", e, self.text()))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// The full `Set-Cookie` header for a cookie name
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&prefix))
            .map(str::to_string)
    }

    /// Value of a cookie set by this response
    pub fn cookie(&self, name: &str) -> Option<String> {
        let set_cookie = self.set_cookie(name)?;
        let pair = set_cookie.split(';').next()?;
        pair.split_once('=').map(|(_, value)| value.to_string())
    }

    /// `{name, message}` error body
    pub fn error(&self) -> (String, String) {
        let body: serde_json::Value = self.json();
        (
            body["name"].as_str().unwrap_or_default().to_string(),
            body["message"].as_str().unwrap_or_default().to_string(),
        )
    }
}

/// multipart/form-data body builder
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}

/// A complete, valid doctor form with a portrait
pub fn doctor_form(name: &str, registration_number: &str) -> MultipartBody {
    doctor_fields(name, registration_number, "42").file(
        "image",
        "portrait.png",
        "image/png",
        b"\x89PNG fake image bytes",
    )
}

pub fn doctor_fields(name: &str, registration_number: &str, age: &str) -> MultipartBody {
    MultipartBody::new()
        .text("name", name)
        .text("age", age)
        .text("specialization", "Cardiology")
        .text("qualification", "MD")
        .text("contactNumber", "9876543210")
        .text("registrationNumber", registration_number)
}
