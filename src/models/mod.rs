pub mod admin;
pub mod auth;
pub mod doctor;
pub mod post;
pub mod refresh_token;
pub mod response;

// Re-export common types
pub use admin::{
    normalize_email, AccessTokenResponse, Admin, LoginRequest, RegisterAdminRequest,
    ResetPasswordRequest,
};
pub use auth::{AdminClaims, TokenSubject};
pub use doctor::{
    Doctor, DoctorChanges, DoctorListResponse, DoctorQuery, DoctorResponse, NewDoctor,
    DOCTOR_PAGE_SIZE,
};
pub use post::{
    Audience, ContentType, FileTypeQuery, NewPost, Post, PostContent, PostIdQuery,
    PostListResponse, PostResponse, PostStatus, UpdatePostRequest,
};
pub use refresh_token::TokenRecord;
pub use response::StatusMessage;
