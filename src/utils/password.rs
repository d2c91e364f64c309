// Password hashing and verification utilities using bcrypt

use thiserror::Error;

/// Errors that can occur during password operations
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingError(String),

    #[error("Failed to verify password: {0}")]
    VerificationError(String),
}

/// Hash a password with the configured bcrypt cost
///
/// bcrypt is CPU-bound, so the work runs on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| PasswordError::HashingError(e.to_string()))?
        .map_err(|e| PasswordError::HashingError(e.to_string()))
}

/// Verify a password against a stored bcrypt hash
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| PasswordError::VerificationError(e.to_string()))?
        .map_err(|e| PasswordError::VerificationError(e.to_string()))
}
