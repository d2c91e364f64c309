// Library exports for the admin backend
// main.rs and the integration tests both build the router from here

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, middleware::from_fn_with_state, routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, ConfigError};
pub use db::{InMemoryStore, MongoStore};
pub use services::{CloudflareHost, CloudinaryHost, JwtService, MemoryAssetHost};
pub use utils::app_error::{AppError, AppResult};

/// Connect to MongoDB and the asset hosts and assemble the shared state
pub async fn initialize_app_state(
    config: AppConfig,
) -> Result<AppState, Box<dyn std::error::Error + Send + Sync>> {
    info!("Connecting to MongoDB...");
    let store = Arc::new(MongoStore::connect(&config.database).await?);
    store.ensure_indexes().await;

    let jwt_service = Arc::new(JwtService::new(services::JwtConfig::from_app_config(
        &config.jwt,
    )));
    let rate_limiter = Arc::new(services::IpRateLimiter::new(
        services::RateLimitConfig::from_security(&config.security),
    )?);

    let doctor_images = Arc::new(CloudinaryHost::new(config.cloudinary.clone()));
    let post_media = Arc::new(CloudflareHost::new(config.cloudflare.clone()));

    Ok(AppState {
        config: Arc::new(config),
        jwt_service,
        admins: store.clone(),
        tokens: store.clone(),
        doctors: store.clone(),
        posts: store,
        doctor_images,
        post_media,
        rate_limiter,
    })
}

/// Full application router with every middleware layer applied.
///
/// Layers run outermost first: tracing, security headers, rate limiting,
/// CORS, then the authentication gate.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;

    Router::new()
        .route("/", get(handlers::root_health))
        .nest("/api/admin/auth", handlers::auth_routes())
        .nest("/api/admin/dataManager", handlers::data_manager_routes())
        .fallback(handlers::route_not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware))
        .layer(from_fn_with_state(state.clone(), middleware::cors_middleware))
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit_middleware))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
