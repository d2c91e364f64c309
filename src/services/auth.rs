// Admin authentication: registration, login, token refresh, logout and password reset

use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    app::AppState,
    db::{parse_object_id, AdminStore, TokenStore},
    models::{normalize_email, Admin, LoginRequest, RegisterAdminRequest, TokenSubject},
    services::jwt::{JwtError, JwtService},
    utils::{
        app_error::{AppError, AppResult},
        password::{hash_password, verify_password},
    },
};

const MAX_PASSWORD_LENGTH: usize = 128;

/// Tokens handed out on a successful login
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    admins: Arc<dyn AdminStore>,
    tokens: Arc<dyn TokenStore>,
    jwt_service: Arc<JwtService>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            admins: state.admins.clone(),
            tokens: state.tokens.clone(),
            jwt_service: state.jwt_service.clone(),
            bcrypt_cost: state.config.security.bcrypt_cost,
        }
    }

    #[instrument(skip_all)]
    pub async fn register(&self, request: RegisterAdminRequest) -> AppResult<Admin> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(AppError::validation("Email and password are required"));
        }

        let request = RegisterAdminRequest {
            email: normalize_email(&request.email),
            password: request.password,
        };
        request.validate()?;

        if self.admins.email_exists(&request.email).await? {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let password_hash = hash_password(&request.password, self.bcrypt_cost).await?;
        let admin = Admin::new(request.email, password_hash);

        // A concurrent registration that slipped past the check lands on the unique index
        self.admins.insert_admin(&admin).await?;

        info!(admin_id = %admin.id, "Admin registered");
        Ok(admin)
    }

    #[instrument(skip_all)]
    pub async fn login(&self, request: LoginRequest) -> AppResult<IssuedTokens> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(AppError::validation("Credentials required"));
        }

        let email = normalize_email(&request.email);
        let admin = match self.admins.find_admin_by_email(&email).await? {
            Some(admin) => admin,
            None => {
                warn!("Login attempt for unknown email");
                return Err(AppError::unauthorized("Invalid credentials"));
            },
        };

        if !verify_password(&request.password, &admin.password_hash).await? {
            warn!(admin_id = %admin.id, "Login attempt with wrong password");
            return Err(AppError::unauthorized("Invalid credentials"));
        }

        let subject = admin.token_subject();
        let access_token = self.jwt_service.generate_access_token(&subject)?;
        let refresh_token = self.jwt_service.generate_refresh_token(&subject)?;

        // Replaces any refresh token from an earlier session
        self.tokens
            .upsert_refresh_token(&admin.id, &refresh_token)
            .await?;

        info!(admin_id = %admin.id, "Admin logged in");
        Ok(IssuedTokens {
            access_token,
            refresh_token,
        })
    }

    /// Exchange the refresh cookie for a new access token.
    ///
    /// When the caller also presents its (possibly expired) access token, both
    /// tokens must belong to the same admin.
    #[instrument(skip_all)]
    pub async fn refresh(
        &self,
        refresh_token: Option<&str>,
        bearer_token: Option<&str>,
    ) -> AppResult<String> {
        let refresh_token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthorized("Refresh token not provided"))?;

        let claims = self
            .jwt_service
            .validate_refresh_token(refresh_token)
            .map_err(|e| match e {
                JwtError::TokenExpired => {
                    AppError::TokenExpired("Refresh token expired".to_string())
                },
                JwtError::InvalidToken => AppError::unauthorized("Invalid refresh token"),
                other => other.into(),
            })?;

        if let Some(bearer) = bearer_token {
            let access_claims = self
                .jwt_service
                .validate_access_token_ignoring_expiry(bearer)
                .map_err(|_| AppError::unauthorized("Invalid access token"))?;
            if access_claims.admin_id != claims.admin_id {
                warn!(
                    refresh_admin = %claims.admin_id,
                    access_admin = %access_claims.admin_id,
                    "Token pair belongs to different admins"
                );
                return Err(AppError::unauthorized("Invalid token"));
            }
        }

        let admin_id = parse_object_id(&claims.admin_id)
            .map_err(|_| AppError::unauthorized("Invalid refresh token"))?;

        if self
            .tokens
            .find_refresh_token(&admin_id, refresh_token)
            .await?
            .is_none()
        {
            return Err(AppError::unauthorized("Invalid refresh token"));
        }

        let access_token = self
            .jwt_service
            .generate_access_token(&TokenSubject::from(&claims))?;
        Ok(access_token)
    }

    #[instrument(skip_all)]
    pub async fn logout(&self, refresh_token: Option<&str>) -> AppResult<()> {
        let refresh_token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthorized("Refresh token not provided"))?;

        match self.tokens.delete_refresh_token(refresh_token).await? {
            Some(record) => {
                info!(admin_id = %record.admin_id, "Admin logged out");
                Ok(())
            },
            None => Err(AppError::unauthorized("Invalid refresh token")),
        }
    }

    #[instrument(skip_all, fields(admin_id = %admin.id))]
    pub async fn reset_password(&self, admin: &Admin, password: &str) -> AppResult<()> {
        if password.is_empty() {
            return Err(AppError::validation("Password required"));
        }
        if password.chars().count() > MAX_PASSWORD_LENGTH {
            return Err(AppError::validation(
                "Password must be between 1 and 128 characters",
            ));
        }

        let password_hash = hash_password(password, self.bcrypt_cost).await?;
        if !self.admins.update_password(&admin.id, &password_hash).await? {
            return Err(AppError::NotFound("Admin not found".to_string()));
        }

        info!("Admin password reset");
        Ok(())
    }
}
