// Persistence seams: one trait per collection, implemented by MongoDB and in memory

use async_trait::async_trait;
use bson::oid::ObjectId;
use thiserror::Error;

use crate::models::{Admin, Doctor, DoctorQuery, Post, TokenRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Duplicate(String),

    #[error("Invalid ID: {0}")]
    InvalidId(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Parse a hex ObjectId coming from a path or query parameter
pub fn parse_object_id(value: &str) -> StoreResult<ObjectId> {
    ObjectId::parse_str(value.trim()).map_err(|_| StoreError::InvalidId(value.to_string()))
}

/// Credential store
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn email_exists(&self, email: &str) -> StoreResult<bool>;

    /// Insert a new admin; a taken email yields `StoreError::Duplicate`
    async fn insert_admin(&self, admin: &Admin) -> StoreResult<()>;

    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<Admin>>;

    async fn find_admin_by_id(&self, id: &ObjectId) -> StoreResult<Option<Admin>>;

    /// Returns false when no admin has that id
    async fn update_password(&self, id: &ObjectId, password_hash: &str) -> StoreResult<bool>;
}

/// Refresh token store: at most one record per admin
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Replace (or create) the admin's stored refresh token
    async fn upsert_refresh_token(&self, admin_id: &ObjectId, token: &str) -> StoreResult<()>;

    async fn find_refresh_token(
        &self,
        admin_id: &ObjectId,
        token: &str,
    ) -> StoreResult<Option<TokenRecord>>;

    /// Delete by exact value; returns the removed record, if any
    async fn delete_refresh_token(&self, token: &str) -> StoreResult<Option<TokenRecord>>;
}

/// Content store for doctors
#[async_trait]
pub trait DoctorStore: Send + Sync {
    /// One page of doctors matching the search, plus the full match count
    async fn list_doctors(&self, query: &DoctorQuery) -> StoreResult<(Vec<Doctor>, u64)>;

    async fn find_doctor(&self, id: &ObjectId) -> StoreResult<Option<Doctor>>;

    /// A doctor other than `exclude` sharing the given name or registration number
    async fn find_conflicting_doctor(
        &self,
        name: Option<&str>,
        registration_number: Option<&str>,
        exclude: Option<&ObjectId>,
    ) -> StoreResult<Option<Doctor>>;

    async fn insert_doctor(&self, doctor: &Doctor) -> StoreResult<()>;

    /// Persist all fields of an existing doctor; false when it vanished
    async fn replace_doctor(&self, doctor: &Doctor) -> StoreResult<bool>;

    async fn delete_doctor(&self, id: &ObjectId) -> StoreResult<Option<Doctor>>;
}

/// Content store for promotional posts
#[async_trait]
pub trait PostStore: Send + Sync {
    /// All posts, newest first
    async fn list_posts(&self) -> StoreResult<Vec<Post>>;

    async fn find_post(&self, id: &ObjectId) -> StoreResult<Option<Post>>;

    async fn insert_post(&self, post: &Post) -> StoreResult<()>;

    async fn replace_post(&self, post: &Post) -> StoreResult<bool>;

    async fn delete_post(&self, id: &ObjectId) -> StoreResult<Option<Post>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_id() {
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex()).unwrap(), id);
        assert!(matches!(parse_object_id("nope"), Err(StoreError::InvalidId(_))));
    }
}
