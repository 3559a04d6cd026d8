//! CSRF protection.
//!
//! Double-submit cookie: every response to a request without a valid
//! `csrftoken` cookie sets one, pages embed the token in their forms, and
//! [`CsrfForm`] only accepts a POST whose `csrfmiddlewaretoken` field equals
//! the cookie.

use std::sync::Arc;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request, State},
    http::{header::SET_COOKIE, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::Rng;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::WebError;
use super::state::AppState;

/// Name of the CSRF cookie.
pub const CSRF_COOKIE: &str = "csrftoken";

/// Name of the form field carrying the token.
pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";

const TOKEN_LENGTH: usize = 32;
const TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// The CSRF token of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(pub String);

impl CsrfToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Generate a fresh random token.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LENGTH)
        .map(|_| TOKEN_CHARSET[rng.random_range(0..TOKEN_CHARSET.len())] as char)
        .collect()
}

fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Ensure every request has a CSRF token, issuing the cookie when missing.
pub async fn csrf_cookie(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = CookieJar::from_headers(request.headers())
        .get(CSRF_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|token| is_well_formed(token));

    let (token, issued) = match existing {
        Some(token) => (token, false),
        None => (generate_token(), true),
    };
    request.extensions_mut().insert(CsrfToken(token.clone()));

    let mut response = next.run(request).await;

    if issued {
        let cookie = Cookie::build((CSRF_COOKIE, token))
            .path("/")
            .same_site(SameSite::Lax)
            .secure(state.config.session.secure_cookies)
            .build();
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!(error = %e, "Could not encode CSRF cookie"),
        }
    }

    response
}

#[async_trait]
impl<S> FromRequestParts<S> for CsrfToken
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CsrfToken>()
            .cloned()
            .ok_or_else(|| WebError::Internal("CSRF middleware is not installed".to_string()))
    }
}

/// A url-encoded form that passed the CSRF check.
#[derive(Debug, Clone)]
pub struct CsrfForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for CsrfForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let cookie = CookieJar::from_headers(req.headers())
            .get(CSRF_COOKIE)
            .map(|c| c.value().to_string());
        let path = req.uri().path().to_string();

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| WebError::BadRequest(e.to_string()))?;

        let mut submitted = None;
        let mut fields = serde_json::Map::new();
        for (key, value) in url::form_urlencoded::parse(&body) {
            if key == CSRF_FIELD {
                submitted = Some(value.into_owned());
            } else {
                fields.insert(key.into_owned(), serde_json::Value::String(value.into_owned()));
            }
        }

        let valid = match (&cookie, &submitted) {
            (Some(cookie), Some(submitted)) => {
                is_well_formed(cookie) && constant_time_eq(cookie.as_bytes(), submitted.as_bytes())
            }
            _ => false,
        };
        if !valid {
            warn!(
                path = %path,
                has_cookie = cookie.is_some(),
                has_field = submitted.is_some(),
                "CSRF verification failed"
            );
            return Err(WebError::Forbidden(
                "CSRF verification failed. Request aborted.".to_string(),
            ));
        }

        debug!(path = %path, "CSRF token verified");
        serde_json::from_value(serde_json::Value::Object(fields))
            .map(CsrfForm)
            .map_err(|e| WebError::BadRequest(format!("invalid form data: {e}")))
    }
}
