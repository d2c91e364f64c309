// JWT token service for admin sessions
// HS256 with separate secrets for access and refresh tokens

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

use crate::models::auth::{AdminClaims, TokenSubject};

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("JWT encoding error: {0}")]
    EncodingError(String),

    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::TokenExpired,
            // Every other decode failure (bad signature, malformed, wrong algorithm) is a bad token
            _ => JwtError::InvalidToken,
        }
    }
}

#[derive(Clone)]
pub struct JwtConfig {
    pub access_token_expiry: u64,
    pub refresh_token_expiry: u64,
    pub algorithm: Algorithm,

    pub access_encoding_key: EncodingKey,
    pub access_decoding_key: DecodingKey,

    pub refresh_encoding_key: EncodingKey,
    pub refresh_decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .field("algorithm", &self.algorithm)
            .field("access_encoding_key", &"<redacted>")
            .field("access_decoding_key", &"<redacted>")
            .field("refresh_encoding_key", &"<redacted>")
            .field("refresh_decoding_key", &"<redacted>")
            .finish()
    }
}

impl JwtConfig {
    fn build_from_params(
        access_secret: &str,
        refresh_secret: &str,
        access_expiry: u64,
        refresh_expiry: u64,
    ) -> Self {
        JwtConfig {
            access_token_expiry: access_expiry,
            refresh_token_expiry: refresh_expiry,
            algorithm: Algorithm::HS256,
            access_encoding_key: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding_key: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding_key: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding_key: DecodingKey::from_secret(refresh_secret.as_bytes()),
        }
    }

    pub fn from_app_config(config: &crate::app_config::JwtConfig) -> Self {
        let crate::app_config::JwtConfig {
            access_secret,
            refresh_secret,
            access_expiry,
            refresh_expiry,
        } = config;

        Self::build_from_params(access_secret, refresh_secret, *access_expiry, *refresh_expiry)
    }

    #[cfg(test)]
    pub fn for_test(access_expiry: u64) -> Self {
        Self::build_from_params(
            "test-access-secret-hs256",
            "test-refresh-secret-hs256",
            access_expiry,
            604800,
        )
    }
}

pub struct JwtService {
    config: JwtConfig,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    fn now() -> Result<u64, JwtError> {
        Ok(SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| JwtError::KeyGenerationError(e.to_string()))?
            .as_secs())
    }

    fn claims_for(subject: &TokenSubject, now: u64, lifetime: u64) -> AdminClaims {
        AdminClaims {
            admin_id: subject.admin_id.clone(),
            is_master: subject.is_master,
            access: subject.access.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + lifetime,
        }
    }

    fn validation(&self, validate_exp: bool) -> Validation {
        let mut validation = Validation::new(self.config.algorithm);
        validation.validate_exp = validate_exp;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0; // Tokens are dead the second they expire
        validation
    }

    pub fn generate_access_token(&self, subject: &TokenSubject) -> Result<String, JwtError> {
        let claims = Self::claims_for(subject, Self::now()?, self.config.access_token_expiry);
        encode(
            &Header::new(self.config.algorithm),
            &claims,
            &self.config.access_encoding_key,
        )
        .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    pub fn generate_refresh_token(&self, subject: &TokenSubject) -> Result<String, JwtError> {
        let claims = Self::claims_for(subject, Self::now()?, self.config.refresh_token_expiry);
        encode(
            &Header::new(self.config.algorithm),
            &claims,
            &self.config.refresh_encoding_key,
        )
        .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    pub fn validate_access_token(&self, token: &str) -> Result<AdminClaims, JwtError> {
        let token_data =
            decode::<AdminClaims>(token, &self.config.access_decoding_key, &self.validation(true))?;
        Ok(token_data.claims)
    }

    /// Signature-checked decode of an access token that may already be expired.
    /// Only used to cross-check identity during a refresh.
    pub fn validate_access_token_ignoring_expiry(
        &self,
        token: &str,
    ) -> Result<AdminClaims, JwtError> {
        let token_data = decode::<AdminClaims>(
            token,
            &self.config.access_decoding_key,
            &self.validation(false),
        )?;
        Ok(token_data.claims)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<AdminClaims, JwtError> {
        let token_data = decode::<AdminClaims>(
            token,
            &self.config.refresh_decoding_key,
            &self.validation(true),
        )?;
        Ok(token_data.claims)
    }
}
