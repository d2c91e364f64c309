// Centralized configuration management for the admin backend
// Load ALL env vars ONCE at startup, then hand the immutable config to every service

use std::collections::HashMap;
use std::env;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
    pub cloudinary: CloudinaryConfig,
    pub cloudflare: CloudflareConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    /// Maximum accepted request body, uploads included
    pub body_limit_bytes: usize,
}

/// Environment type
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            "production" | "prod" | "docker" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// MongoDB configuration
#[derive(Clone)]
pub struct DatabaseConfig {
    pub connection_string: String,
    pub database_name: String,
}

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    /// Access token lifetime in seconds
    pub access_expiry: u64,
    /// Refresh token lifetime in seconds, also the refresh cookie max-age
    pub refresh_expiry: u64,
}

/// Security configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub bcrypt_cost: u32,
    pub cors_allowed_origins: Vec<String>,
    /// Number of reverse proxies in front of the service
    pub number_of_proxies: usize,
    pub rate_limit_window_seconds: u64,
    pub rate_limit_max_requests: u32,
}

/// Cloudinary credentials, used for doctor portraits
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    pub api_base_url: String,
}

/// Cloudflare credentials, used for promotional post media
#[derive(Clone)]
pub struct CloudflareConfig {
    pub account_id: String,
    pub images_api_key: String,
    pub stream_api_token: String,
    pub api_base_url: String,
}

const REDACTED: &str = "<redacted>";

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Connection strings carry credentials
        f.debug_struct("DatabaseConfig")
            .field("connection_string", &REDACTED)
            .field("database_name", &self.database_name)
            .finish()
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &REDACTED)
            .field("refresh_secret", &REDACTED)
            .field("access_expiry", &self.access_expiry)
            .field("refresh_expiry", &self.refresh_expiry)
            .finish()
    }
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &REDACTED)
            .field("api_secret", &REDACTED)
            .field("folder", &self.folder)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl std::fmt::Debug for CloudflareConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareConfig")
            .field("account_id", &self.account_id)
            .field("images_api_key", &REDACTED)
            .field("stream_api_token", &REDACTED)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an explicit key/value map
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Helper function to get required var
        let get_required = |key: &str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVar(key.to_string()))
        };

        // Helper function to get optional var with default
        let get_or_default = |key: &str, default: &str| -> String {
            lookup(key).unwrap_or_else(|| default.to_string())
        };

        let parse_u64_or_default = |key: &str, default: &str| -> Result<u64, ConfigError> {
            get_or_default(key, default).trim().parse().map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "not a valid u64".to_string())
            })
        };

        let parse_u32_or_default = |key: &str, default: &str| -> Result<u32, ConfigError> {
            let value = parse_u64_or_default(key, default)?;
            u32::try_from(value).map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "out of range for u32".to_string())
            })
        };

        let parse_usize_or_default = |key: &str, default: &str| -> Result<usize, ConfigError> {
            let value = parse_u64_or_default(key, default)?;
            usize::try_from(value).map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "out of range for usize".to_string())
            })
        };

        let parse_duration_or_default = |key: &str, default: &str| -> Result<u64, ConfigError> {
            parse_duration_secs(&get_or_default(key, default)).ok_or_else(|| {
                ConfigError::InvalidValue(key.to_string(), "not a valid duration".to_string())
            })
        };

        let environment_str = lookup("ENVIRONMENT")
            .or_else(|| lookup("NODE_ENV"))
            .unwrap_or_else(|| "development".to_string());
        let environment = Environment::from(environment_str);
        let relaxed = matches!(environment, Environment::Development | Environment::Test);

        // Server
        let host = get_or_default("HOST", "0.0.0.0");
        let port: u16 = get_or_default("PORT", "8080").trim().parse().map_err(|_| {
            ConfigError::InvalidValue("PORT".to_string(), "not a valid port".to_string())
        })?;
        let rust_log = get_or_default("RUST_LOG", "info");
        let body_limit_bytes = parse_usize_or_default("BODY_LIMIT_BYTES", "10485760")?;

        // Database
        let connection_string = get_required("MONGO_CONNECTION_STRING")?;
        let database_name = get_or_default("MONGO_DATABASE", "admin_backend");

        // JWT secrets validation
        let access_secret = get_required("ACCESS_TOKEN_SECRET")?;
        let refresh_secret = get_required("REFRESH_TOKEN_SECRET")?;
        if !relaxed {
            for (key, secret) in [
                ("ACCESS_TOKEN_SECRET", &access_secret),
                ("REFRESH_TOKEN_SECRET", &refresh_secret),
            ] {
                if secret.len() < 32 {
                    return Err(ConfigError::InvalidValue(
                        key.to_string(),
                        "Secret must be at least 32 characters long".to_string(),
                    ));
                }
            }
        }
        if access_secret == refresh_secret {
            return Err(ConfigError::InvalidValue(
                "REFRESH_TOKEN_SECRET".to_string(),
                "must differ from ACCESS_TOKEN_SECRET".to_string(),
            ));
        }

        let access_expiry = parse_duration_or_default("ACCESS_TOKEN_LIFE", "15m")?;
        let refresh_expiry = parse_duration_or_default("REFRESH_TOKEN_LIFE", "7d")?;

        // Security
        let bcrypt_cost = parse_u32_or_default("BCRYPT_COST", "10")?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidValue(
                "BCRYPT_COST".to_string(),
                "must be between 4 and 31".to_string(),
            ));
        }

        let origins_source = if environment == Environment::Development {
            get_or_default("DEV_URL", "http://localhost:3000")
        } else {
            get_or_default("PRODUCTION_URL", "")
        };
        let cors_allowed_origins: Vec<String> = origins_source
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let number_of_proxies = parse_usize_or_default("NUMBER_OF_PROXIES", "1")?;
        let rate_limit_window_seconds = parse_u64_or_default("RATE_LIMIT_WINDOW_SECONDS", "900")?;
        let rate_limit_max_requests = parse_u32_or_default("RATE_LIMIT_MAX_REQUESTS", "500")?;
        if rate_limit_window_seconds == 0 || rate_limit_max_requests == 0 {
            return Err(ConfigError::InvalidValue(
                "RATE_LIMIT_MAX_REQUESTS".to_string(),
                "rate limit window and maximum must be positive".to_string(),
            ));
        }

        let cloudinary = CloudinaryConfig {
            cloud_name: get_required("CLOUDINARY_CLOUD_NAME")?,
            api_key: get_required("CLOUDINARY_API_KEY")?,
            api_secret: get_required("CLOUDINARY_API_SECRET")?,
            folder: get_or_default("CLOUDINARY_FOLDER", "doctors"),
            api_base_url: get_or_default(
                "CLOUDINARY_API_URL",
                "https://api.cloudinary.com/v1_1",
            ),
        };

        let cloudflare = CloudflareConfig {
            account_id: get_required("CLOUDFLARE_ACCOUNT_ID")?,
            images_api_key: get_required("CLOUDFLARE_API_KEY")?,
            stream_api_token: get_required("CLOUDFLARE_STREAM_API_TOKEN")?,
            api_base_url: get_or_default(
                "CLOUDFLARE_API_URL",
                "https://api.cloudflare.com/client/v4",
            ),
        };

        Ok(Self {
            environment,
            server: ServerConfig {
                host,
                port,
                rust_log,
                body_limit_bytes,
            },
            database: DatabaseConfig {
                connection_string,
                database_name,
            },
            jwt: JwtConfig {
                access_secret,
                refresh_secret,
                access_expiry,
                refresh_expiry,
            },
            security: SecurityConfig {
                bcrypt_cost,
                cors_allowed_origins,
                number_of_proxies,
                rate_limit_window_seconds,
                rate_limit_max_requests,
            },
            cloudinary,
            cloudflare,
        })
    }

    /// Cookies are only marked `Secure` outside of development
    pub fn secure_cookies(&self) -> bool {
        self.environment != Environment::Development && self.environment != Environment::Test
    }

    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Parse an `ms`-style duration ("900", "15m", "12h", "7d", "30s") into seconds
pub fn parse_duration_secs(input: &str) -> Option<u64> {
    let value = input.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }

    let split_at = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split_at);
    let amount: u64 = digits.parse().ok()?;

    let multiplier = match unit.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600,
        "d" | "day" | "days" => 86_400,
        "w" | "week" | "weeks" => 604_800,
        _ => return None,
    };

    amount.checked_mul(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        [
            ("ENVIRONMENT", "test"),
            ("MONGO_CONNECTION_STRING", "mongodb://localhost:27017"),
            ("ACCESS_TOKEN_SECRET", "access-secret"),
            ("REFRESH_TOKEN_SECRET", "refresh-secret"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "key"),
            ("CLOUDINARY_API_SECRET", "secret"),
            ("CLOUDFLARE_ACCOUNT_ID", "account"),
            ("CLOUDFLARE_API_KEY", "images-key"),
            ("CLOUDFLARE_STREAM_API_TOKEN", "stream-token"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(parse_duration_secs("900"), Some(900));
        assert_eq!(parse_duration_secs("15m"), Some(900));
        assert_eq!(parse_duration_secs("1h"), Some(3600));
        assert_eq!(parse_duration_secs("7d"), Some(604_800));
        assert_eq!(parse_duration_secs("2 days"), Some(172_800));
        assert_eq!(parse_duration_secs("soon"), None);
        assert_eq!(parse_duration_secs(""), None);
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_map(&base_vars()).unwrap();
        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.jwt.access_expiry, 900);
        assert_eq!(config.jwt.refresh_expiry, 604_800);
        assert_eq!(config.security.rate_limit_max_requests, 500);
        assert_eq!(config.security.rate_limit_window_seconds, 900);
        assert_eq!(config.database.database_name, "admin_backend");
        assert_eq!(config.cloudinary.folder, "doctors");
        assert!(!config.secure_cookies());
    }

    #[test]
    fn test_missing_mongo_string() {
        let mut vars = base_vars();
        vars.remove("MONGO_CONNECTION_STRING");
        assert_eq!(
            AppConfig::from_map(&vars).unwrap_err(),
            ConfigError::MissingVar("MONGO_CONNECTION_STRING".to_string())
        );
    }

    #[test]
    fn test_short_secret_rejected_in_production() {
        let mut vars = base_vars();
        vars.insert("ENVIRONMENT".to_string(), "production".to_string());
        assert!(matches!(
            AppConfig::from_map(&vars),
            Err(ConfigError::InvalidValue(key, _)) if key == "ACCESS_TOKEN_SECRET"
        ));
    }

    #[test]
    fn test_integer_overflow_rejected() {
        for (key, value) in [
            ("BCRYPT_COST", "4294967300"),
            ("RATE_LIMIT_MAX_REQUESTS", "4294967296"),
            ("NUMBER_OF_PROXIES", "two"),
        ] {
            let mut vars = base_vars();
            vars.insert(key.to_string(), value.to_string());
            assert!(
                matches!(
                    AppConfig::from_map(&vars),
                    Err(ConfigError::InvalidValue(ref k, _)) if k == key
                ),
                "{} = {} should be rejected",
                key,
                value
            );
        }
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut vars = base_vars();
        vars.insert(
            "MONGO_CONNECTION_STRING".to_string(),
            "mongodb://root:hunter2@db:27017".to_string(),
        );
        let rendered = format!("{:?}", AppConfig::from_map(&vars).unwrap());
        for secret in [
            "hunter2",
            "access-secret",
            "refresh-secret",
            "images-key",
            "stream-token",
        ] {
            assert!(!rendered.contains(secret), "{} leaked", secret);
        }
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_production_origins_split() {
        let mut vars = base_vars();
        vars.insert("NODE_ENV".to_string(), "production".to_string());
        vars.remove("ENVIRONMENT");
        vars.insert("ACCESS_TOKEN_SECRET".to_string(), "a".repeat(32));
        vars.insert("REFRESH_TOKEN_SECRET".to_string(), "b".repeat(32));
        vars.insert(
            "PRODUCTION_URL".to_string(),
            "https://admin.example.com, https://ops.example.com".to_string(),
        );

        let config = AppConfig::from_map(&vars).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert!(config.secure_cookies());
        assert_eq!(
            config.security.cors_allowed_origins,
            vec!["https://admin.example.com", "https://ops.example.com"]
        );
    }
}
