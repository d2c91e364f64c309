// Middleware modules
// Authentication gate, rate limiting, CORS and security headers

pub mod auth_middleware;
pub mod cors;
pub mod rate_limit;
pub mod security_headers;

pub use auth_middleware::{auth_middleware, AuthenticatedAdmin};
pub use cors::cors_middleware;
pub use rate_limit::rate_limit_middleware;
pub use security_headers::security_headers_middleware;
