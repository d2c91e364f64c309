// Stored refresh token: one active value per admin

use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Row in the `tokens` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub admin_id: ObjectId,
    pub refresh_token: String,
    pub created_at: DateTime,
}

impl TokenRecord {
    pub fn new(admin_id: ObjectId, refresh_token: String) -> Self {
        Self {
            id: ObjectId::new(),
            admin_id,
            refresh_token,
            created_at: DateTime::now(),
        }
    }
}
