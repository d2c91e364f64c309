// HTTP handlers and route builders

pub mod auth;
pub mod doctors;
pub mod posts;
pub mod upload;

use crate::{app::AppState, utils::app_error::ErrorBody};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;

// Authentication routes, mounted at /api/admin/auth
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/registerAdmin", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refreshToken", post(auth::refresh_token))
        .route("/logout", post(auth::logout))
        .route("/resetPassword", post(auth::reset_password))
}

// Doctor and post management, mounted at /api/admin/dataManager
pub fn data_manager_routes() -> Router<AppState> {
    Router::new()
        .route("/doctor", post(doctors::create_doctor))
        .route(
            "/doctor/{param}",
            get(doctors::list_doctors).delete(doctors::delete_doctor),
        )
        .route(
            "/editDoctor/{id}",
            axum::routing::put(doctors::update_doctor).patch(doctors::update_doctor),
        )
        .route(
            "/adminPost",
            get(posts::list_posts)
                .post(posts::upload_post)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        )
}

pub async fn root_health() -> Json<serde_json::Value> {
    Json(json!({ "message": "OK" }))
}

pub async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            name: "NotFound".to_string(),
            message: "Route not found!".to_string(),
        }),
    )
}
