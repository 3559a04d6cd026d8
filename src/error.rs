//! Error types for the forum.

use thiserror::Error;

/// Common error type for the forum.
#[derive(Error, Debug)]
pub enum ForumError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Template error.
    #[error("template error: {0}")]
    Template(#[from] crate::template::TemplateError),

    /// Locale catalogue error.
    #[error("locale error: {0}")]
    I18n(#[from] crate::i18n::I18nError),

    /// Outgoing mail could not be built or delivered.
    #[error("mail error: {0}")]
    Mail(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for ForumError {
    fn from(e: sqlx::Error) -> Self {
        ForumError::Database(e.to_string())
    }
}

/// Result type alias for forum operations.
pub type Result<T> = std::result::Result<T, ForumError>;
