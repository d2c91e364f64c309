// Plain acknowledgement bodies

use serde::{Deserialize, Serialize};

/// `{status: "success", message}` acknowledgement
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}

impl StatusMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}
