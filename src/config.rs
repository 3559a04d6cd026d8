//! Configuration module for the forum.

use serde::Deserialize;
use std::path::Path;

use crate::{ForumError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Absolute base URL used in links sent by mail (no trailing slash).
    #[serde(default = "default_site_url")]
    pub site_url: String,
    /// Secret key used to sign password reset tokens (must be set).
    #[serde(default)]
    pub secret_key: String,
    /// Whether to serve static files.
    #[serde(default = "default_serve_static")]
    pub serve_static: bool,
    /// Path to static files directory.
    #[serde(default = "default_static_path")]
    pub static_path: String,
    /// Rate limit for login, signup and reset submissions (requests per minute per IP).
    #[serde(default = "default_auth_rate_limit")]
    pub auth_rate_limit: u32,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_site_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_serve_static() -> bool {
    true
}

fn default_static_path() -> String {
    "static".to_string()
}

fn default_auth_rate_limit() -> u32 {
    20
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            site_url: default_site_url(),
            secret_key: String::new(),
            serve_static: default_serve_static(),
            static_path: default_static_path(),
            auth_rate_limit: default_auth_rate_limit(),
        }
    }
}

impl ServerConfig {
    /// Build an absolute URL for a site-relative path.
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.site_url.trim_end_matches('/'), path)
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/forum.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Locale configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LocaleConfig {
    /// Language code of the message catalogue.
    #[serde(default = "default_language")]
    pub language: String,
    /// Directory containing `<language>.toml` catalogues.
    #[serde(default = "default_locales_path")]
    pub path: String,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_locales_path() -> String {
    "locales".to_string()
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            path: default_locales_path(),
        }
    }
}

/// Templates configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesConfig {
    /// Path to the templates directory.
    #[serde(default = "default_templates_path")]
    pub path: String,
}

fn default_templates_path() -> String {
    "templates".to_string()
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            path: default_templates_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file path. Console only when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Where outgoing mail goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MailBackend {
    /// Write mails to the log.
    #[default]
    Console,
    /// Deliver through an SMTP relay.
    Smtp,
    /// Keep mails in memory (tests).
    Memory,
}

/// Mail configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Delivery backend.
    #[serde(default)]
    pub backend: MailBackend,
    /// Sender address.
    #[serde(default = "default_from_email")]
    pub from_email: String,
    /// Prefix prepended to every subject.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
    /// SMTP relay host.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: String,
}

fn default_from_email() -> String {
    "noreply@localhost".to_string()
}

fn default_subject_prefix() -> String {
    "[Forum]".to_string()
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            backend: MailBackend::default(),
            from_email: default_from_email(),
            subject_prefix: default_subject_prefix(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in seconds.
    #[serde(default = "default_session_duration")]
    pub duration_secs: u64,
    /// Mark the session cookie `Secure`.
    #[serde(default)]
    pub secure_cookies: bool,
    /// Failed logins before a username is locked out.
    #[serde(default = "default_max_login_attempts")]
    pub max_login_attempts: u32,
    /// Lockout duration in seconds.
    #[serde(default = "default_lockout_secs")]
    pub lockout_secs: u64,
}

fn default_session_duration() -> u64 {
    60 * 60 * 24 * 14
}

fn default_max_login_attempts() -> u32 {
    5
}

fn default_lockout_secs() -> u64 {
    300
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_session_duration(),
            secure_cookies: false,
            max_login_attempts: default_max_login_attempts(),
            lockout_secs: default_lockout_secs(),
        }
    }
}

/// A board created at startup if no board with that name exists.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BoardSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Forum behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ForumConfig {
    /// Site name shown in the navigation bar and mails.
    #[serde(default = "default_forum_name")]
    pub name: String,
    /// Topics per page on a board.
    #[serde(default = "default_topics_per_page")]
    pub topics_per_page: u32,
    /// Posts per page in a topic.
    #[serde(default = "default_posts_per_page")]
    pub posts_per_page: u32,
    /// Lifetime of password reset links in seconds.
    #[serde(default = "default_password_reset_timeout")]
    pub password_reset_timeout_secs: u64,
    /// Boards created on startup.
    #[serde(default)]
    pub boards: Vec<BoardSeed>,
}

fn default_forum_name() -> String {
    "Forum".to_string()
}

fn default_topics_per_page() -> u32 {
    20
}

fn default_posts_per_page() -> u32 {
    10
}

fn default_password_reset_timeout() -> u64 {
    60 * 60 * 24 * 3
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            name: default_forum_name(),
            topics_per_page: default_topics_per_page(),
            posts_per_page: default_posts_per_page(),
            password_reset_timeout_secs: default_password_reset_timeout(),
            boards: Vec::new(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub locale: LocaleConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub forum: ForumConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ForumError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ForumError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FORUM_SECRET_KEY`: signing key for reset tokens
    /// - `FORUM_SMTP_PASSWORD`: SMTP password
    pub fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("FORUM_SECRET_KEY") {
            if !secret.is_empty() {
                self.server.secret_key = secret;
            }
        }
        if let Ok(password) = std::env::var("FORUM_SMTP_PASSWORD") {
            if !password.is_empty() {
                self.mail.smtp_password = password;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.server.secret_key.is_empty() {
            return Err(ForumError::Config(
                "secret_key is not set. \
                 Set it in config.toml or via FORUM_SECRET_KEY environment variable."
                    .to_string(),
            ));
        }
        if self.forum.topics_per_page == 0 || self.forum.posts_per_page == 0 {
            return Err(ForumError::Config(
                "topics_per_page and posts_per_page must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
