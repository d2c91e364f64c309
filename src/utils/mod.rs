// Utility modules

pub mod app_error;
pub mod client_ip;
pub mod password;
pub mod validation;

pub use app_error::{AppError, AppResult, ErrorBody};
pub use client_ip::resolve_client_ip;
pub use password::{hash_password, verify_password, PasswordError};
pub use validation::{trim_and_validate_field, trim_optional_field};
