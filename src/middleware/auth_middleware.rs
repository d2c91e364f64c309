// Authentication gate for protected routes
// Validates the bearer access token and injects AuthenticatedAdmin into request extensions

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::{
    app::AppState,
    db::parse_object_id,
    models::Admin,
    services::jwt::JwtError,
    utils::app_error::AppError,
};

/// Routes reachable without an access token
const PUBLIC_PATHS: &[&str] = &[
    "/",
    "/api/admin/auth/registerAdmin",
    "/api/admin/auth/login",
    "/api/admin/auth/refreshToken",
    "/api/admin/auth/logout",
];

/// The admin behind the current request's access token
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin {
    pub admin: Admin,
}

pub fn is_public_request(method: &Method, path: &str) -> bool {
    // CORS preflights carry no credentials
    if method == Method::OPTIONS {
        return true;
    }
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };
    PUBLIC_PATHS.contains(&path)
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AuthenticatedAdmin, AppError> {
    let token =
        bearer_token(headers).ok_or_else(|| AppError::unauthorized("Invalid access token"))?;

    let claims = state
        .jwt_service
        .validate_access_token(token)
        .map_err(|e| match e {
            JwtError::TokenExpired => AppError::TokenExpired("Access token expired".to_string()),
            _ => AppError::unauthorized("Invalid access token"),
        })?;

    let admin_id =
        parse_object_id(&claims.admin_id).map_err(|_| AppError::unauthorized("Invalid token"))?;
    let admin = state
        .admins
        .find_admin_by_id(&admin_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid token"))?;

    Ok(AuthenticatedAdmin { admin })
}

/// Middleware function that validates access tokens and adds AuthenticatedAdmin to extensions
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if is_public_request(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    match authenticate(&app_state, request.headers()).await {
        Ok(authenticated) => {
            request.extensions_mut().insert(authenticated);
            next.run(request).await
        },
        Err(e) => {
            warn!(path = %request.uri().path(), error = %e, "Authentication failed");
            e.into_response()
        },
    }
}

/// Extractor for AuthenticatedAdmin from request extensions
impl FromRequestParts<AppState> for AuthenticatedAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedAdmin>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}
