// Application state shared across handlers
use std::sync::Arc;

use crate::{
    app_config::AppConfig,
    db::{AdminStore, DoctorStore, PostStore, TokenStore},
    services::{asset_host::AssetHost, IpRateLimiter, JwtService},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt_service: Arc<JwtService>,
    pub admins: Arc<dyn AdminStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub doctors: Arc<dyn DoctorStore>,
    pub posts: Arc<dyn PostStore>,
    /// Portrait storage for doctors (Cloudinary in production)
    pub doctor_images: Arc<dyn AssetHost>,
    /// Image and video storage for posts (Cloudflare in production)
    pub post_media: Arc<dyn AssetHost>,
    pub rate_limiter: Arc<IpRateLimiter>,
}
