//! Password reset tokens.
//!
//! A reset link carries two path segments: the user id encoded as unpadded
//! URL-safe base64, and a token `{timestamp_base36}-{signature_hex}`.
//! The signature is an HMAC-SHA256 over the user's id, password hash and last
//! login together with the timestamp, so a token stops verifying once the
//! password changes or the user logs in again.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::db::User;

type HmacSha256 = Hmac<Sha256>;

/// Number of signature bytes kept in the token.
const SIGNATURE_BYTES: usize = 10;

/// Reasons a reset link is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("token expired")]
    Expired,

    #[error("token signature mismatch")]
    BadSignature,

    #[error("invalid secret key")]
    InvalidKey,
}

/// Encode a user id for use in a reset URL.
pub fn encode_uid(user_id: i64) -> String {
    URL_SAFE_NO_PAD.encode(user_id.to_string())
}

/// Decode a user id from a reset URL segment.
pub fn decode_uid(uidb64: &str) -> Option<i64> {
    let bytes = URL_SAFE_NO_PAD.decode(uidb64).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    text.parse().ok()
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn from_base36(s: &str) -> Option<u64> {
    if s.is_empty() || s.len() > 13 {
        return None;
    }
    u64::from_str_radix(s, 36).ok()
}

/// Generates and checks password reset tokens.
#[derive(Clone)]
pub struct ResetTokenGenerator {
    secret: Vec<u8>,
    timeout_secs: u64,
}

impl ResetTokenGenerator {
    /// Create a generator keyed by the server secret.
    pub fn new(secret: impl AsRef<[u8]>, timeout_secs: u64) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            timeout_secs,
        }
    }

    fn mac(&self, user: &User, timestamp: u64) -> Result<HmacSha256, TokenError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| TokenError::InvalidKey)?;
        mac.update(b"forum.password-reset\0");
        mac.update(user.id.to_string().as_bytes());
        mac.update(b"\0");
        mac.update(user.password.as_bytes());
        mac.update(b"\0");
        mac.update(user.last_login.as_deref().unwrap_or("").as_bytes());
        mac.update(b"\0");
        mac.update(timestamp.to_string().as_bytes());
        Ok(mac)
    }

    /// Make a token for `user` at the current time.
    pub fn make_token(&self, user: &User) -> Result<String, TokenError> {
        self.make_token_at(user, now_secs())
    }

    /// Make a token for `user` stamped with `timestamp` (seconds since the epoch).
    pub fn make_token_at(&self, user: &User, timestamp: u64) -> Result<String, TokenError> {
        let digest = self.mac(user, timestamp)?.finalize().into_bytes();
        Ok(format!(
            "{}-{}",
            to_base36(timestamp),
            hex::encode(&digest[..SIGNATURE_BYTES])
        ))
    }

    /// Check a token for `user` at the current time.
    pub fn check_token(&self, user: &User, token: &str) -> Result<(), TokenError> {
        self.check_token_at(user, token, now_secs())
    }

    /// Check a token for `user` as of `now` (seconds since the epoch).
    pub fn check_token_at(&self, user: &User, token: &str, now: u64) -> Result<(), TokenError> {
        let (ts, sig) = token.split_once('-').ok_or(TokenError::Malformed)?;
        let timestamp = from_base36(ts).ok_or(TokenError::Malformed)?;
        let sig = hex::decode(sig).map_err(|_| TokenError::Malformed)?;
        if sig.len() != SIGNATURE_BYTES {
            return Err(TokenError::Malformed);
        }

        self.mac(user, timestamp)?
            .verify_truncated_left(&sig)
            .map_err(|_| TokenError::BadSignature)?;

        if now.saturating_sub(timestamp) > self.timeout_secs {
            return Err(TokenError::Expired);
        }
        Ok(())
    }
}

fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
