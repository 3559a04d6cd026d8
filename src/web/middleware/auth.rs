//! Session authentication extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

use crate::db::{User, UserRepository};
use crate::web::error::WebError;
use crate::web::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sessionid";

/// Build the session cookie for `token`.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Cookie used to remove the session cookie.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// The visitor of the current request, if logged in.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser {
    pub user: Option<User>,
    /// Session token of the logged-in user.
    pub session_token: Option<String>,
}

impl CurrentUser {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

async fn resolve_user(parts: &Parts, state: &AppState) -> Result<CurrentUser, WebError> {
    let token = match CookieJar::from_headers(&parts.headers).get(SESSION_COOKIE) {
        Some(cookie) if !cookie.value().is_empty() => cookie.value().to_string(),
        _ => return Ok(CurrentUser::anonymous()),
    };

    let user_id = {
        let mut sessions = state.sessions.lock().await;
        match sessions.get_session(&token) {
            Ok(session) => session.user_id,
            Err(e) => {
                tracing::debug!("Ignoring session cookie: {}", e);
                return Ok(CurrentUser::anonymous());
            }
        }
    };

    let user = UserRepository::new(state.db.pool())
        .get_by_id(user_id)
        .await?
        .filter(|u| u.is_active);

    Ok(match user {
        Some(user) => CurrentUser {
            user: Some(user),
            session_token: Some(token),
        },
        None => CurrentUser::anonymous(),
    })
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = WebError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            // Resolved once per request
            if let Some(current) = parts.extensions.get::<CurrentUser>() {
                return Ok(current.clone());
            }

            let current = resolve_user(parts, state).await?;
            parts.extensions.insert(current.clone());
            Ok(current)
        })
    }
}

/// Extractor for handlers that require a logged-in user.
///
/// Anonymous visitors are redirected to the login page with the current
/// path as `next`.
#[derive(Debug, Clone)]
pub struct LoginRequired {
    pub user: User,
    pub session_token: String,
}

impl FromRequestParts<Arc<AppState>> for LoginRequired {
    type Rejection = WebError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let current = CurrentUser::from_request_parts(parts, state).await?;

            match (current.user, current.session_token) {
                (Some(user), Some(session_token)) => Ok(LoginRequired {
                    user,
                    session_token,
                }),
                _ => {
                    let next = parts
                        .uri
                        .path_and_query()
                        .map(|pq| pq.as_str().to_string())
                        .unwrap_or_else(|| parts.uri.path().to_string());
                    Err(WebError::LoginRequired { next })
                }
            }
        })
    }
}

impl From<LoginRequired> for CurrentUser {
    fn from(login: LoginRequired) -> Self {
        CurrentUser {
            user: Some(login.user),
            session_token: Some(login.session_token),
        }
    }
}
