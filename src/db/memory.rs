// In-process stores with the same uniqueness rules as the MongoDB indexes.
// Used by the test harness and for running the server without a database.

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime};
use tokio::sync::RwLock;

use crate::{
    db::stores::{AdminStore, DoctorStore, PostStore, StoreError, StoreResult, TokenStore},
    models::{Admin, Doctor, DoctorQuery, Post, TokenRecord, DOCTOR_PAGE_SIZE},
};

#[derive(Default)]
pub struct InMemoryStore {
    admins: RwLock<Vec<Admin>>,
    tokens: RwLock<Vec<TokenRecord>>,
    doctors: RwLock<Vec<Doctor>>,
    posts: RwLock<Vec<Post>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn doctor_count(&self) -> usize {
        self.doctors.read().await.len()
    }

    pub async fn post_count(&self) -> usize {
        self.posts.read().await.len()
    }

    pub async fn token_count(&self) -> usize {
        self.tokens.read().await.len()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn doctor_matches(doctor: &Doctor, search: Option<&str>) -> bool {
    match search.map(str::trim).filter(|s| !s.is_empty()) {
        None => true,
        Some(text) => {
            let needle = text.to_lowercase();
            contains_ignore_case(&doctor.name, &needle)
                || contains_ignore_case(&doctor.specialization, &needle)
                || contains_ignore_case(&doctor.qualification, &needle)
        },
    }
}

fn duplicate_doctor() -> StoreError {
    StoreError::Duplicate(
        "Doctor with the same name or registration number already exists.".to_string(),
    )
}

#[async_trait]
impl AdminStore for InMemoryStore {
    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(self.admins.read().await.iter().any(|a| a.email == email))
    }

    async fn insert_admin(&self, admin: &Admin) -> StoreResult<()> {
        let mut admins = self.admins.write().await;
        if admins.iter().any(|a| a.email == admin.email) {
            return Err(StoreError::Duplicate("Email already exists".to_string()));
        }
        admins.push(admin.clone());
        Ok(())
    }

    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<Admin>> {
        Ok(self
            .admins
            .read()
            .await
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_admin_by_id(&self, id: &ObjectId) -> StoreResult<Option<Admin>> {
        Ok(self.admins.read().await.iter().find(|a| a.id == *id).cloned())
    }

    async fn update_password(&self, id: &ObjectId, password_hash: &str) -> StoreResult<bool> {
        let mut admins = self.admins.write().await;
        match admins.iter_mut().find(|a| a.id == *id) {
            Some(admin) => {
                admin.password_hash = password_hash.to_string();
                Ok(true)
            },
            None => Ok(false),
        }
    }
}

#[async_trait]
impl TokenStore for InMemoryStore {
    async fn upsert_refresh_token(&self, admin_id: &ObjectId, token: &str) -> StoreResult<()> {
        let mut tokens = self.tokens.write().await;
        match tokens.iter_mut().find(|t| t.admin_id == *admin_id) {
            Some(record) => {
                record.refresh_token = token.to_string();
                record.created_at = DateTime::now();
            },
            None => tokens.push(TokenRecord::new(*admin_id, token.to_string())),
        }
        Ok(())
    }

    async fn find_refresh_token(
        &self,
        admin_id: &ObjectId,
        token: &str,
    ) -> StoreResult<Option<TokenRecord>> {
        Ok(self
            .tokens
            .read()
            .await
            .iter()
            .find(|t| t.admin_id == *admin_id && t.refresh_token == token)
            .cloned())
    }

    async fn delete_refresh_token(&self, token: &str) -> StoreResult<Option<TokenRecord>> {
        let mut tokens = self.tokens.write().await;
        Ok(tokens
            .iter()
            .position(|t| t.refresh_token == token)
            .map(|index| tokens.remove(index)))
    }
}

#[async_trait]
impl DoctorStore for InMemoryStore {
    async fn list_doctors(&self, query: &DoctorQuery) -> StoreResult<(Vec<Doctor>, u64)> {
        let doctors = self.doctors.read().await;
        let mut matching: Vec<&Doctor> = doctors
            .iter()
            .filter(|d| doctor_matches(d, query.search.as_deref()))
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(query.skip() as usize)
            .take(DOCTOR_PAGE_SIZE as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn find_doctor(&self, id: &ObjectId) -> StoreResult<Option<Doctor>> {
        Ok(self.doctors.read().await.iter().find(|d| d.id == *id).cloned())
    }

    async fn find_conflicting_doctor(
        &self,
        name: Option<&str>,
        registration_number: Option<&str>,
        exclude: Option<&ObjectId>,
    ) -> StoreResult<Option<Doctor>> {
        Ok(self
            .doctors
            .read()
            .await
            .iter()
            .filter(|d| exclude != Some(&d.id))
            .find(|d| {
                name == Some(d.name.as_str())
                    || registration_number == Some(d.registration_number.as_str())
            })
            .cloned())
    }

    async fn insert_doctor(&self, doctor: &Doctor) -> StoreResult<()> {
        let mut doctors = self.doctors.write().await;
        if doctors.iter().any(|d| {
            d.name == doctor.name || d.registration_number == doctor.registration_number
        }) {
            return Err(duplicate_doctor());
        }
        doctors.push(doctor.clone());
        Ok(())
    }

    async fn replace_doctor(&self, doctor: &Doctor) -> StoreResult<bool> {
        let mut doctors = self.doctors.write().await;
        if doctors.iter().any(|d| {
            d.id != doctor.id
                && (d.name == doctor.name || d.registration_number == doctor.registration_number)
        }) {
            return Err(duplicate_doctor());
        }
        match doctors.iter_mut().find(|d| d.id == doctor.id) {
            Some(stored) => {
                *stored = doctor.clone();
                Ok(true)
            },
            None => Ok(false),
        }
    }

    async fn delete_doctor(&self, id: &ObjectId) -> StoreResult<Option<Doctor>> {
        let mut doctors = self.doctors.write().await;
        Ok(doctors
            .iter()
            .position(|d| d.id == *id)
            .map(|index| doctors.remove(index)))
    }
}

#[async_trait]
impl PostStore for InMemoryStore {
    async fn list_posts(&self) -> StoreResult<Vec<Post>> {
        let mut posts = self.posts.read().await.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn find_post(&self, id: &ObjectId) -> StoreResult<Option<Post>> {
        Ok(self.posts.read().await.iter().find(|p| p.id == *id).cloned())
    }

    async fn insert_post(&self, post: &Post) -> StoreResult<()> {
        self.posts.write().await.push(post.clone());
        Ok(())
    }

    async fn replace_post(&self, post: &Post) -> StoreResult<bool> {
        let mut posts = self.posts.write().await;
        match posts.iter_mut().find(|p| p.id == post.id) {
            Some(stored) => {
                *stored = post.clone();
                Ok(true)
            },
            None => Ok(false),
        }
    }

    async fn delete_post(&self, id: &ObjectId) -> StoreResult<Option<Post>> {
        let mut posts = self.posts.write().await;
        Ok(posts
            .iter()
            .position(|p| p.id == *id)
            .map(|index| posts.remove(index)))
    }
}
