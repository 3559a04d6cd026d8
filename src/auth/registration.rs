//! User registration.

use thiserror::Error;
use tracing::info;

use crate::auth::validation::{
    validate_email, validate_password_not_username, validate_username, ValidationError,
};
use crate::auth::{hash_password, PasswordError};
use crate::db::{NewUser, User, UserRepository};

/// Registration-specific errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Username or email failed validation, or the password resembles the username.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("A user with that username already exists.")]
    UsernameExists,

    /// Password policy violation or hashing failure.
    #[error("{0}")]
    Password(#[from] PasswordError),

    #[error("database error: {0}")]
    Database(String),
}

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            email: String::new(),
        }
    }

    /// Set the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }
}

/// Register a new user.
///
/// Validates the request, checks that the username is free, hashes the
/// password and stores the user.
pub async fn register(
    repo: &UserRepository<'_>,
    request: RegistrationRequest,
) -> Result<User, RegistrationError> {
    validate_username(&request.username)?;
    validate_email(&request.email)?;
    crate::auth::validate_password(&request.password)?;
    validate_password_not_username(&request.password, &request.username)?;

    if repo
        .username_exists(&request.username)
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?
    {
        return Err(RegistrationError::UsernameExists);
    }

    let password_hash = hash_password(&request.password)?;
    let new_user = NewUser::new(&request.username, password_hash).with_email(&request.email);

    let user = repo
        .create(&new_user)
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?;

    info!(
        username = %user.username,
        user_id = user.id,
        "New user registered"
    );

    Ok(user)
}
