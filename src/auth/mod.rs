//! Authentication module.
//!
//! This module provides password hashing, session management, password
//! reset tokens and user registration.

mod password;
mod registration;
mod session;
pub mod token;
pub mod validation;

pub use password::{
    hash_password, validate_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
    MIN_PASSWORD_LENGTH,
};
pub use registration::{register, RegistrationError, RegistrationRequest};
pub use session::{
    AuthSession, LimitResult, LoginLimiter, SessionError, SessionManager,
    DEFAULT_SESSION_DURATION_SECS, LOCKOUT_DURATION_SECS, MAX_LOGIN_ATTEMPTS,
};
pub use token::{decode_uid, encode_uid, ResetTokenGenerator, TokenError};
pub use validation::ValidationError;
