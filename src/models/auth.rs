// Token claims shared by access and refresh tokens

use serde::{Deserialize, Serialize};

/// Claims carried by both token kinds; only the signing secret and lifetime differ
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminClaims {
    /// Admin ObjectId as a hex string
    pub admin_id: String,

    #[serde(default)]
    pub is_master: bool,

    #[serde(default)]
    pub access: Vec<String>,

    /// Unique token id, so two tokens minted in the same second never collide
    pub jti: String,

    /// Issued at timestamp (Unix epoch seconds)
    pub iat: u64,

    /// Expires at timestamp (Unix epoch seconds)
    pub exp: u64,
}

/// Identity data minted into a token pair
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSubject {
    pub admin_id: String,
    pub is_master: bool,
    pub access: Vec<String>,
}

impl From<&AdminClaims> for TokenSubject {
    fn from(claims: &AdminClaims) -> Self {
        Self {
            admin_id: claims.admin_id.clone(),
            is_master: claims.is_master,
            access: claims.access.clone(),
        }
    }
}
