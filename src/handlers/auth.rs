// Authentication handlers: register, login, refresh, logout, password reset
// The refresh token travels only in an HTTP-only cookie

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::{
    app::AppState,
    app_config::AppConfig,
    middleware::{auth_middleware::bearer_token, AuthenticatedAdmin},
    models::{
        AccessTokenResponse, LoginRequest, RegisterAdminRequest, ResetPasswordRequest,
        StatusMessage,
    },
    services::AuthService,
    utils::app_error::AppResult,
};

pub const REFRESH_COOKIE: &str = "refreshToken";

/// Cross-site cookies must be `Secure`; plain-http development falls back to Lax
fn cookie_same_site(config: &AppConfig) -> SameSite {
    if config.secure_cookies() {
        SameSite::None
    } else {
        SameSite::Lax
    }
}

/// Helper function to create the refresh token cookie
fn create_refresh_token_cookie(token: String, config: &AppConfig) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies())
        .same_site(cookie_same_site(config))
        .max_age(Duration::seconds(config.jwt.refresh_expiry as i64))
        .build()
}

/// Helper function to create a cookie that deletes the refresh token
fn create_delete_refresh_cookie(config: &AppConfig) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies())
        .same_site(cookie_same_site(config))
        .max_age(Duration::seconds(0))
        .build()
}

fn refresh_cookie_value(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_COOKIE).map(|cookie| cookie.value().to_string())
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterAdminRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(request) = payload?;
    AuthService::new(&state).register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(StatusMessage::success("Admin registered successfully")),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(request) = payload?;
    let tokens = AuthService::new(&state).login(request).await?;

    let jar = jar.add(create_refresh_token_cookie(tokens.refresh_token, &state.config));
    Ok((
        jar,
        Json(AccessTokenResponse {
            access_token: tokens.access_token,
        }),
    ))
}

/// Issue a new access token from the refresh cookie. An `Authorization`
/// header, when present, must carry an access token of the same admin.
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> AppResult<Json<AccessTokenResponse>> {
    let refresh = refresh_cookie_value(&jar);
    let access_token = AuthService::new(&state)
        .refresh(refresh.as_deref(), bearer_token(&headers))
        .await?;

    Ok(Json(AccessTokenResponse { access_token }))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let refresh = refresh_cookie_value(&jar);
    AuthService::new(&state).logout(refresh.as_deref()).await?;

    let jar = jar.add(create_delete_refresh_cookie(&state.config));
    Ok((jar, Json(StatusMessage::success("Logged out successfully"))))
}

pub async fn reset_password(
    State(state): State<AppState>,
    authenticated: AuthenticatedAdmin,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> AppResult<Json<StatusMessage>> {
    let Json(request) = payload?;
    AuthService::new(&state)
        .reset_password(&authenticated.admin, &request.password)
        .await?;

    Ok(Json(StatusMessage::success("Password reset successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(environment: &str) -> AppConfig {
        let vars: HashMap<String, String> = [
            ("ENVIRONMENT", environment),
            ("MONGO_CONNECTION_STRING", "mongodb://localhost:27017"),
            ("ACCESS_TOKEN_SECRET", "access-secret-that-is-long-enough-0001"),
            ("REFRESH_TOKEN_SECRET", "refresh-secret-that-is-long-enough-001"),
            ("REFRESH_TOKEN_LIFE", "7d"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "key"),
            ("CLOUDINARY_API_SECRET", "secret"),
            ("CLOUDFLARE_ACCOUNT_ID", "account"),
            ("CLOUDFLARE_API_KEY", "images"),
            ("CLOUDFLARE_STREAM_API_TOKEN", "stream"),
            ("PRODUCTION_URL", "https://admin.example.com"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        AppConfig::from_map(&vars).unwrap()
    }

    #[test]
    fn test_refresh_cookie_attributes_in_development() {
        let cookie = create_refresh_token_cookie("a.b.c".to_string(), &config("development"));
        assert_eq!(cookie.name(), REFRESH_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));
    }

    #[test]
    fn test_refresh_cookie_is_secure_in_production() {
        let cookie = create_refresh_token_cookie("a.b.c".to_string(), &config("production"));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
    }

    #[test]
    fn test_delete_cookie_expires_immediately() {
        let cookie = create_delete_refresh_cookie(&config("development"));
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
