// MongoDB-backed stores
// Collection names follow the existing deployment: admins, tokens, doctors, adminposts

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime, Document};
use futures_util::TryStreamExt;
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, FindOptions, IndexOptions, UpdateOptions},
    Client, Collection, Database, IndexModel,
};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::{
    app_config::DatabaseConfig,
    db::stores::{AdminStore, DoctorStore, PostStore, StoreError, StoreResult, TokenStore},
    models::{Admin, Doctor, DoctorQuery, Post, TokenRecord, DOCTOR_PAGE_SIZE},
};

const ADMINS: &str = "admins";
const TOKENS: &str = "tokens";
const DOCTORS: &str = "doctors";
const POSTS: &str = "adminposts";

/// MongoDB error code for unique index violations
const DUPLICATE_KEY: i32 = 11000;

impl From<mongodb::error::Error> for StoreError {
    fn from(error: mongodb::error::Error) -> Self {
        if is_duplicate_key(&error) {
            StoreError::Duplicate("Duplicate key".to_string())
        } else {
            StoreError::Database(error.to_string())
        }
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Result of a database ping
#[derive(Debug, Clone)]
pub struct DatabaseHealth {
    pub is_healthy: bool,
    pub latency_ms: u64,
    pub error: Option<String>,
}

/// Handle to the application database; cheap to clone (the driver pools connections)
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connect and verify the server answers a ping
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(&config.connection_string).await?;
        options.app_name = Some("medadmin-backend".to_string());
        options.server_selection_timeout = Some(Duration::from_secs(10));

        let client = Client::with_options(options)?;
        let store = Self {
            db: client.database(&config.database_name),
        };

        let health = store.health_check().await;
        if !health.is_healthy {
            return Err(StoreError::Database(
                health.error.unwrap_or_else(|| "ping failed".to_string()),
            ));
        }

        info!(
            database = %config.database_name,
            latency_ms = health.latency_ms,
            "Database connected successfully"
        );
        Ok(store)
    }

    pub async fn health_check(&self) -> DatabaseHealth {
        let start = Instant::now();
        match self.db.run_command(doc! { "ping": 1 }, None).await {
            Ok(_) => DatabaseHealth {
                is_healthy: true,
                latency_ms: start.elapsed().as_millis() as u64,
                error: None,
            },
            Err(e) => DatabaseHealth {
                is_healthy: false,
                latency_ms: start.elapsed().as_millis() as u64,
                error: Some(e.to_string()),
            },
        }
    }

    /// Create the unique indexes backing the uniqueness invariants.
    ///
    /// Index creation fails on collections that already hold duplicates; that
    /// is logged and the query-level checks remain the only guard.
    pub async fn ensure_indexes(&self) {
        let unique = || IndexOptions::builder().unique(true).build();

        let indexes: [(&str, Document); 4] = [
            (ADMINS, doc! { "email": 1 }),
            (TOKENS, doc! { "adminId": 1 }),
            (DOCTORS, doc! { "name": 1 }),
            (DOCTORS, doc! { "registrationNumber": 1 }),
        ];

        for (collection, keys) in indexes {
            let model = IndexModel::builder()
                .keys(keys.clone())
                .options(unique())
                .build();
            if let Err(e) = self
                .db
                .collection::<Document>(collection)
                .create_index(model, None)
                .await
            {
                warn!(collection, keys = %keys, error = %e, "Failed to create unique index");
            }
        }
    }

    fn admins(&self) -> Collection<Admin> {
        self.db.collection(ADMINS)
    }

    fn tokens(&self) -> Collection<TokenRecord> {
        self.db.collection(TOKENS)
    }

    fn doctors(&self) -> Collection<Doctor> {
        self.db.collection(DOCTORS)
    }

    fn posts(&self) -> Collection<Post> {
        self.db.collection(POSTS)
    }
}

fn to_document<T: serde::Serialize>(value: &T) -> StoreResult<Document> {
    bson::to_document(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Case-insensitive substring match across the searchable doctor fields
fn doctor_search_filter(search: Option<&str>) -> Document {
    match search.map(str::trim).filter(|s| !s.is_empty()) {
        None => doc! {},
        Some(text) => {
            let pattern = regex::escape(text);
            doc! {
                "$or": [
                    { "name": { "$regex": pattern.as_str(), "$options": "i" } },
                    { "specialization": { "$regex": pattern.as_str(), "$options": "i" } },
                    { "qualification": { "$regex": pattern.as_str(), "$options": "i" } },
                ]
            }
        },
    }
}

#[async_trait]
impl AdminStore for MongoStore {
    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let count = self
            .admins()
            .count_documents(doc! { "email": email }, None)
            .await?;
        Ok(count > 0)
    }

    async fn insert_admin(&self, admin: &Admin) -> StoreResult<()> {
        self.admins().insert_one(admin, None).await.map_err(|e| {
            if is_duplicate_key(&e) {
                StoreError::Duplicate("Email already exists".to_string())
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<Admin>> {
        Ok(self.admins().find_one(doc! { "email": email }, None).await?)
    }

    async fn find_admin_by_id(&self, id: &ObjectId) -> StoreResult<Option<Admin>> {
        Ok(self.admins().find_one(doc! { "_id": *id }, None).await?)
    }

    async fn update_password(&self, id: &ObjectId, password_hash: &str) -> StoreResult<bool> {
        let result = self
            .admins()
            .update_one(
                doc! { "_id": *id },
                doc! { "$set": { "password": password_hash } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }
}

#[async_trait]
impl TokenStore for MongoStore {
    async fn upsert_refresh_token(&self, admin_id: &ObjectId, token: &str) -> StoreResult<()> {
        let filter = doc! { "adminId": *admin_id };
        let update = doc! {
            "$set": { "refreshToken": token, "createdAt": DateTime::now() },
        };
        let options = UpdateOptions::builder().upsert(true).build();

        match self
            .tokens()
            .update_one(filter.clone(), update.clone(), options.clone())
            .await
        {
            Ok(_) => Ok(()),
            // A concurrent login inserted first; the record now exists, so update it
            Err(e) if is_duplicate_key(&e) => {
                warn!(admin_id = %admin_id, "Concurrent refresh token upsert, retrying");
                self.tokens().update_one(filter, update, options).await?;
                Ok(())
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn find_refresh_token(
        &self,
        admin_id: &ObjectId,
        token: &str,
    ) -> StoreResult<Option<TokenRecord>> {
        Ok(self
            .tokens()
            .find_one(doc! { "adminId": *admin_id, "refreshToken": token }, None)
            .await?)
    }

    async fn delete_refresh_token(&self, token: &str) -> StoreResult<Option<TokenRecord>> {
        Ok(self
            .tokens()
            .find_one_and_delete(doc! { "refreshToken": token }, None)
            .await?)
    }
}

#[async_trait]
impl DoctorStore for MongoStore {
    async fn list_doctors(&self, query: &DoctorQuery) -> StoreResult<(Vec<Doctor>, u64)> {
        let filter = doctor_search_filter(query.search.as_deref());
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": 1, "_id": 1 })
            .skip(query.skip())
            .limit(DOCTOR_PAGE_SIZE as i64)
            .build();

        let doctors: Vec<Doctor> = self
            .doctors()
            .find(filter.clone(), options)
            .await?
            .try_collect()
            .await?;
        let total = self.doctors().count_documents(filter, None).await?;

        Ok((doctors, total))
    }

    async fn find_doctor(&self, id: &ObjectId) -> StoreResult<Option<Doctor>> {
        Ok(self.doctors().find_one(doc! { "_id": *id }, None).await?)
    }

    async fn find_conflicting_doctor(
        &self,
        name: Option<&str>,
        registration_number: Option<&str>,
        exclude: Option<&ObjectId>,
    ) -> StoreResult<Option<Doctor>> {
        let mut any_of = Vec::new();
        if let Some(name) = name {
            any_of.push(doc! { "name": name });
        }
        if let Some(registration_number) = registration_number {
            any_of.push(doc! { "registrationNumber": registration_number });
        }
        if any_of.is_empty() {
            return Ok(None);
        }

        let mut filter = doc! { "$or": any_of };
        if let Some(id) = exclude {
            filter.insert("_id", doc! { "$ne": *id });
        }

        Ok(self.doctors().find_one(filter, None).await?)
    }

    async fn insert_doctor(&self, doctor: &Doctor) -> StoreResult<()> {
        self.doctors().insert_one(doctor, None).await.map_err(|e| {
            if is_duplicate_key(&e) {
                StoreError::Duplicate(
                    "Doctor with the same name or registration number already exists.".to_string(),
                )
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    async fn replace_doctor(&self, doctor: &Doctor) -> StoreResult<bool> {
        let result = self
            .doctors()
            .replace_one(doc! { "_id": doctor.id }, doctor, None)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    StoreError::Duplicate(
                        "Doctor with the same name or registration number already exists."
                            .to_string(),
                    )
                } else {
                    e.into()
                }
            })?;
        Ok(result.matched_count > 0)
    }

    async fn delete_doctor(&self, id: &ObjectId) -> StoreResult<Option<Doctor>> {
        Ok(self
            .doctors()
            .find_one_and_delete(doc! { "_id": *id }, None)
            .await?)
    }
}

#[async_trait]
impl PostStore for MongoStore {
    async fn list_posts(&self) -> StoreResult<Vec<Post>> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .build();
        Ok(self
            .posts()
            .find(doc! {}, options)
            .await?
            .try_collect()
            .await?)
    }

    async fn find_post(&self, id: &ObjectId) -> StoreResult<Option<Post>> {
        Ok(self.posts().find_one(doc! { "_id": *id }, None).await?)
    }

    async fn insert_post(&self, post: &Post) -> StoreResult<()> {
        self.posts().insert_one(post, None).await?;
        Ok(())
    }

    async fn replace_post(&self, post: &Post) -> StoreResult<bool> {
        // Round-trip through a document so a schema mismatch surfaces as a serialization error
        let replacement = to_document(post)?;
        let result = self
            .db
            .collection::<Document>(POSTS)
            .replace_one(doc! { "_id": post.id }, replacement, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_post(&self, id: &ObjectId) -> StoreResult<Option<Post>> {
        Ok(self
            .posts()
            .find_one_and_delete(doc! { "_id": *id }, None)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_search_matches_everything() {
        assert!(doctor_search_filter(None).is_empty());
        assert!(doctor_search_filter(Some("   ")).is_empty());
    }

    #[test]
    fn test_search_is_escaped_and_case_insensitive() {
        let filter = doctor_search_filter(Some("c++ (peds)"));
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 3);

        let name = clauses[0].as_document().unwrap().get_document("name").unwrap();
        assert_eq!(name.get_str("$regex").unwrap(), r"c\+\+ \(peds\)");
        assert_eq!(name.get_str("$options").unwrap(), "i");
    }
}
