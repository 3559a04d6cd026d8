//! Request middleware and extractors.

pub mod auth;
pub mod rate_limit;
pub mod security;

pub use auth::{CurrentUser, LoginRequired, SESSION_COOKIE};
pub use rate_limit::{auth_rate_limit, RateLimitState};
pub use security::security_headers;
