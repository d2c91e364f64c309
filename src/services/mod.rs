// Services module
// Business logic layer for the application

pub mod asset_host;
pub mod auth;
pub mod background_tasks;
pub mod doctor;
pub mod jwt;
pub mod post;
pub mod rate_limit;

// Re-export commonly used services
pub use asset_host::{
    AssetError, AssetHost, AssetRef, AssetUpload, CloudflareHost, CloudinaryHost, MediaKind,
    MemoryAssetHost, PendingAsset, StoredAsset, UploadedFile,
};
pub use auth::{AuthService, IssuedTokens};
pub use background_tasks::initialize_background_tasks;
pub use doctor::DoctorService;
pub use jwt::{JwtConfig, JwtError, JwtService};
pub use post::PostService;
pub use rate_limit::{IpRateLimiter, RateLimitConfig, RateLimitDecision, RateLimitError};
