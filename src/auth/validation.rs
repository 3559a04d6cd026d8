//! Input validation for account fields.

use thiserror::Error;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username must be at least {MIN_USERNAME_LENGTH} characters.")]
    UsernameTooShort,

    #[error("Username must be at most {MAX_USERNAME_LENGTH} characters.")]
    UsernameTooLong,

    #[error("Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.")]
    UsernameInvalidChars,

    #[error("This username is reserved.")]
    UsernameReserved,

    #[error("The password is too similar to the username.")]
    PasswordSimilarToUsername,

    #[error("Ensure this value has at most {MAX_EMAIL_LENGTH} characters.")]
    EmailTooLong,

    #[error("Enter a valid email address.")]
    EmailInvalidFormat,
}

/// Reserved usernames that cannot be registered.
const RESERVED_USERNAMES: &[&str] = &[
    "admin",
    "administrator",
    "root",
    "system",
    "moderator",
    "support",
    "anonymous",
    "null",
    "undefined",
];

/// Check if a username is reserved.
pub fn is_reserved_username(username: &str) -> bool {
    let lower = username.to_lowercase();
    RESERVED_USERNAMES.iter().any(|&r| r == lower)
}

/// Validate a username.
///
/// Requirements:
/// - Length: 3-150 characters
/// - Characters: ASCII letters, digits and `@ . + - _`
/// - Not a reserved username
///
/// # Examples
///
/// ```
/// use forum::auth::validation::validate_username;
///
/// assert!(validate_username("john.doe").is_ok());
/// assert!(validate_username("ab").is_err());
/// assert!(validate_username("admin").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooShort);
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(ValidationError::UsernameInvalidChars);
    }

    if is_reserved_username(username) {
        return Err(ValidationError::UsernameReserved);
    }

    Ok(())
}

/// Reject passwords equal to, or built around, the username.
pub fn validate_password_not_username(
    password: &str,
    username: &str,
) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Ok(());
    }
    let password = password.to_lowercase();
    let username = username.to_lowercase();
    if password == username || (username.len() >= 4 && password.contains(&username)) {
        return Err(ValidationError::PasswordSimilarToUsername);
    }
    Ok(())
}

/// Validate an email address.
///
/// Empty is accepted; callers decide whether the field is required.
///
/// # Examples
///
/// ```
/// use forum::auth::validation::validate_email;
///
/// assert!(validate_email("").is_ok());
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("invalid").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Ok(());
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }

    if email.chars().any(|c| c.is_whitespace()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::EmailInvalidFormat);
    };
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(ValidationError::EmailInvalidFormat);
    }
    if domain.split('.').any(|p| p.is_empty()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    Ok(())
}
