//! Authentication session management.
//!
//! This module provides cookie-backed session tokens and failed-login
//! rate limiting per username.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Session-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Invalid credentials (wrong username or password).
    #[error("Please enter a correct username and password. Note that both fields may be case-sensitive.")]
    InvalidCredentials,

    /// Account is locked due to too many failed attempts.
    #[error("Too many failed login attempts. Try again in {0} seconds.")]
    AccountLocked(u64),

    /// Session has expired.
    #[error("session expired")]
    SessionExpired,

    /// Session not found.
    #[error("session not found")]
    SessionNotFound,

    /// Account is inactive.
    #[error("This account is inactive.")]
    AccountInactive,
}

/// Default session duration (14 days).
pub const DEFAULT_SESSION_DURATION_SECS: u64 = 14 * 24 * 60 * 60;

/// Maximum login attempts before lockout.
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;

/// Lockout duration (5 minutes).
pub const LOCKOUT_DURATION_SECS: u64 = 5 * 60;

/// Authentication session representing a logged-in user.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Unique session token (UUID v4), stored in the session cookie.
    pub token: String,
    /// User ID associated with this session.
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Create a new session with the given lifetime.
    pub fn with_duration(user_id: i64, duration: Duration) -> Self {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::from_std(duration).unwrap_or_default();

        Self {
            token: Uuid::new_v4().to_string(),
            user_id,
            created_at: now,
            expires_at,
        }
    }

    /// Check if the session has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Result of a login attempt rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitResult {
    /// Login attempt is allowed.
    Allowed,
    /// Account is locked for the specified duration.
    Locked(Duration),
}

/// Login attempt rate limiter.
///
/// Tracks failed login attempts per username and enforces lockout
/// after too many failures.
#[derive(Debug)]
pub struct LoginLimiter {
    /// Failed attempts per lowercase username.
    attempts: HashMap<String, Vec<Instant>>,
    max_attempts: u32,
    /// Time window for counting attempts.
    window: Duration,
    /// Lockout duration after exceeding max attempts.
    lockout: Duration,
}

impl Default for LoginLimiter {
    fn default() -> Self {
        Self::with_config(MAX_LOGIN_ATTEMPTS, LOCKOUT_DURATION_SECS, LOCKOUT_DURATION_SECS)
    }
}

impl LoginLimiter {
    /// Create a limiter with custom settings.
    pub fn with_config(max_attempts: u32, window_secs: u64, lockout_secs: u64) -> Self {
        Self {
            attempts: HashMap::new(),
            max_attempts,
            window: Duration::from_secs(window_secs),
            lockout: Duration::from_secs(lockout_secs),
        }
    }

    /// Check if a login attempt is allowed for the given username.
    pub fn check(&mut self, username: &str) -> LimitResult {
        let now = Instant::now();
        let attempts = self.attempts.entry(username.to_lowercase()).or_default();

        attempts.retain(|t| now.duration_since(*t) < self.window);

        if attempts.len() >= self.max_attempts as usize {
            if let Some(oldest) = attempts.first() {
                let elapsed = now.duration_since(*oldest);
                if elapsed < self.lockout {
                    return LimitResult::Locked(self.lockout - elapsed);
                }
                attempts.clear();
            }
        }

        LimitResult::Allowed
    }

    /// Record a failed login attempt.
    pub fn record_failure(&mut self, username: &str) {
        let now = Instant::now();
        let attempts = self.attempts.entry(username.to_lowercase()).or_default();

        attempts.retain(|t| now.duration_since(*t) < self.window);
        attempts.push(now);

        debug!(
            username = %username,
            attempt_count = attempts.len(),
            "Recorded failed login attempt"
        );
    }

    /// Clear all attempts for a username (call on successful login).
    pub fn clear(&mut self, username: &str) {
        self.attempts.remove(&username.to_lowercase());
    }

    /// Clean up expired entries.
    pub fn cleanup(&mut self) {
        let now = Instant::now();
        let window = self.window;
        self.attempts.retain(|_, attempts| {
            attempts.retain(|t| now.duration_since(*t) < window);
            !attempts.is_empty()
        });
    }
}

/// Session manager for tracking active sessions.
///
/// Password verification happens outside the manager so that callers do
/// not hold its lock while hashing.
#[derive(Debug)]
pub struct SessionManager {
    sessions: HashMap<String, AuthSession>,
    limiter: LoginLimiter,
    duration: Duration,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_DURATION_SECS, LoginLimiter::default())
    }
}

impl SessionManager {
    /// Create a session manager with the given session lifetime and limiter.
    pub fn new(duration_secs: u64, limiter: LoginLimiter) -> Self {
        Self {
            sessions: HashMap::new(),
            limiter,
            duration: Duration::from_secs(duration_secs),
        }
    }

    /// Check whether `username` may attempt a login right now.
    pub fn check_login(&mut self, username: &str) -> Result<(), SessionError> {
        match self.limiter.check(username) {
            LimitResult::Locked(remaining) => {
                warn!(
                    username = %username,
                    remaining_secs = remaining.as_secs(),
                    "Login attempt blocked: account locked"
                );
                Err(SessionError::AccountLocked(remaining.as_secs().max(1)))
            }
            LimitResult::Allowed => Ok(()),
        }
    }

    /// Record a failed login for `username`.
    pub fn login_failed(&mut self, username: &str) {
        self.limiter.record_failure(username);
        warn!(username = %username, "Login failed");
    }

    /// Record a successful login and open a session for the user.
    pub fn login_succeeded(&mut self, username: &str, user_id: i64) -> AuthSession {
        self.limiter.clear(username);
        let session = self.start(user_id);
        info!(username = %username, user_id, "Login successful");
        session
    }

    /// Open a session for a user without a credential check (e.g. right after signup).
    pub fn start(&mut self, user_id: i64) -> AuthSession {
        let session = AuthSession::with_duration(user_id, self.duration);
        self.sessions.insert(session.token.clone(), session.clone());
        session
    }

    /// Log out a session by token.
    pub fn logout(&mut self, token: &str) -> bool {
        if let Some(session) = self.sessions.remove(token) {
            info!(user_id = session.user_id, "Session logged out");
            true
        } else {
            debug!("Logout: session not found");
            false
        }
    }

    /// Log out all sessions for a user, optionally keeping one token alive.
    pub fn logout_user(&mut self, user_id: i64, keep: Option<&str>) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|token, s| s.user_id != user_id || Some(token.as_str()) == keep);
        let count = before - self.sessions.len();

        if count > 0 {
            info!(user_id, count, "User sessions logged out");
        }
        count
    }

    /// Get a session by token, removing it if it has expired.
    pub fn get_session(&mut self, token: &str) -> Result<&AuthSession, SessionError> {
        let expired = match self.sessions.get(token) {
            None => return Err(SessionError::SessionNotFound),
            Some(session) => session.is_expired(),
        };

        if expired {
            self.sessions.remove(token);
            return Err(SessionError::SessionExpired);
        }

        self.sessions
            .get(token)
            .ok_or(SessionError::SessionNotFound)
    }

    /// Clean up expired sessions and stale limiter entries.
    pub fn cleanup(&mut self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired());
        self.limiter.cleanup();

        let removed = before - self.sessions.len();
        if removed > 0 {
            debug!(removed, "Cleaned up expired sessions");
        }
        removed
    }

    /// Get the number of active sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Get the number of sessions for a specific user.
    pub fn user_session_count(&self, user_id: i64) -> usize {
        self.sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_auth_session_expiry() {
        let session = AuthSession::with_duration(1, Duration::from_secs(60));
        assert!(!session.is_expired());
        assert_eq!(session.token.len(), 36);

        let session = AuthSession::with_duration(1, Duration::ZERO);
        assert!(session.is_expired());
    }

    #[test]
    fn test_login_limiter_locks_after_max_attempts() {
        let mut limiter = LoginLimiter::with_config(3, 60, 60);
        for _ in 0..3 {
            assert_eq!(limiter.check("john"), LimitResult::Allowed);
            limiter.record_failure("john");
        }
        assert!(matches!(limiter.check("john"), LimitResult::Locked(_)));
        assert!(matches!(limiter.check("JOHN"), LimitResult::Locked(_)));
        assert_eq!(limiter.check("jane"), LimitResult::Allowed);
    }

    #[test]
    fn test_login_limiter_clear() {
        let mut limiter = LoginLimiter::with_config(2, 60, 60);
        limiter.record_failure("john");
        limiter.record_failure("john");
        limiter.clear("John");
        assert_eq!(limiter.check("john"), LimitResult::Allowed);
    }

    #[test]
    fn test_login_limiter_window_expires() {
        let mut limiter = LoginLimiter::with_config(1, 0, 0);
        limiter.record_failure("john");
        sleep(Duration::from_millis(5));
        assert_eq!(limiter.check("john"), LimitResult::Allowed);
        limiter.cleanup();
    }

    #[test]
    fn test_session_manager_login_flow() {
        let mut manager = SessionManager::new(60, LoginLimiter::with_config(2, 60, 60));

        assert!(manager.check_login("john").is_ok());
        manager.login_failed("john");
        manager.login_failed("john");
        assert!(matches!(
            manager.check_login("john"),
            Err(SessionError::AccountLocked(_))
        ));

        let session = manager.login_succeeded("john", 7);
        assert!(manager.check_login("john").is_ok());
        assert_eq!(manager.get_session(&session.token).unwrap().user_id, 7);
    }

    #[test]
    fn test_session_manager_logout() {
        let mut manager = SessionManager::default();
        let session = manager.start(1);

        assert!(manager.logout(&session.token));
        assert!(!manager.logout(&session.token));
        assert_eq!(
            manager.get_session(&session.token).unwrap_err(),
            SessionError::SessionNotFound
        );
    }

    #[test]
    fn test_session_manager_logout_user_keeps_current() {
        let mut manager = SessionManager::default();
        let a = manager.start(1);
        let b = manager.start(1);
        manager.start(2);

        assert_eq!(manager.logout_user(1, Some(&a.token)), 1);
        assert!(manager.get_session(&a.token).is_ok());
        assert!(manager.get_session(&b.token).is_err());
        assert_eq!(manager.user_session_count(2), 1);

        assert_eq!(manager.logout_user(1, None), 1);
        assert_eq!(manager.session_count(), 1);
    }

    #[test]
    fn test_session_manager_expired_session() {
        let mut manager = SessionManager::new(0, LoginLimiter::default());
        let session = manager.start(1);

        assert_eq!(
            manager.get_session(&session.token).unwrap_err(),
            SessionError::SessionExpired
        );
        assert_eq!(manager.session_count(), 0);

        manager.start(2);
        assert_eq!(manager.cleanup(), 1);
    }
}
