// Admin account model

use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::auth::TokenSubject;

/// Admin record as stored in the `admins` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    /// bcrypt hash
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(default)]
    pub is_master: bool,
    #[serde(default)]
    pub access: Vec<String>,
    #[serde(default = "DateTime::now")]
    pub created_at: DateTime,
}

impl Admin {
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: ObjectId::new(),
            email,
            password_hash,
            is_master: false,
            access: Vec::new(),
            created_at: DateTime::now(),
        }
    }

    pub fn token_subject(&self) -> TokenSubject {
        TokenSubject {
            admin_id: self.id.to_hex(),
            is_master: self.is_master,
            access: self.access.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RegisterAdminRequest {
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "Password must be between 1 and 128 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Normalize an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
