// Application error type shared by every handler
// One enum, one mapping to `{name, message}` JSON bodies

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    db::StoreError,
    services::{asset_host::AssetError, jwt::JwtError},
    utils::password::PasswordError,
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    /// A delete or lookup addressed a record that does not exist; reported as 400
    #[error("{0}")]
    MissingRecord(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    TokenExpired(String),

    #[error("Too many requests!")]
    TooManyRequests,

    #[error("{0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Wire format for every error response
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub name: String,
    pub message: String,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) | AppError::MissingRecord(_) => {
                StatusCode::BAD_REQUEST
            },
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) | AppError::TokenExpired(_) => StatusCode::UNAUTHORIZED,
            AppError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::Conflict(_) => "Conflict",
            AppError::MissingRecord(_) | AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::TokenExpired(_) => "TokenExpiredError",
            AppError::TooManyRequests => "TooManyRequests",
            AppError::Upstream(_) => "UpstreamError",
            AppError::Internal(_) => "InternalError",
        }
    }

    /// Message safe to show to clients
    pub fn public_message(&self) -> String {
        match self {
            AppError::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(
                name = self.name(),
                status = status.as_u16(),
                error = %self,
                "Request failed"
            );
        } else {
            tracing::debug!(
                name = self.name(),
                status = status.as_u16(),
                error = %self,
                "Request rejected"
            );
        }

        let body = ErrorBody {
            name: self.name().to_string(),
            message: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

// Conversion from various error types

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Duplicate(msg) => AppError::Conflict(msg),
            StoreError::InvalidId(id) => AppError::Validation(format!("Invalid ID: {}", id)),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<JwtError> for AppError {
    fn from(error: JwtError) -> Self {
        match error {
            JwtError::TokenExpired => AppError::TokenExpired("Token expired".to_string()),
            JwtError::InvalidToken => AppError::Unauthorized("Invalid token".to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<AssetError> for AppError {
    fn from(error: AssetError) -> Self {
        match error {
            AssetError::UnsupportedMedia(msg) => AppError::Validation(msg),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(error: PasswordError) -> Self {
        AppError::Internal(error.to_string())
    }
}

// Extractor rejections keep the `{name, message}` body shape

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", field))
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join(", "))
    }
}
