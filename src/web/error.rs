//! Error responses for the web frontend.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::error;

use crate::template::escape_html;
use crate::ForumError;

/// Error returned by handlers and extractors.
#[derive(Debug)]
pub enum WebError {
    /// Page or object does not exist (404).
    NotFound,
    /// Request refused, e.g. CSRF failure (403).
    Forbidden(String),
    /// Malformed request (400).
    BadRequest(String),
    /// Rate limit exceeded (429).
    TooManyRequests,
    /// Authentication required; redirects to the login page.
    LoginRequired { next: String },
    /// Unexpected failure (500).
    Internal(String),
}

impl WebError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebError::NotFound => StatusCode::NOT_FOUND,
            WebError::Forbidden(_) => StatusCode::FORBIDDEN,
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            WebError::LoginRequired { .. } => StatusCode::SEE_OTHER,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Login URL carrying the page to return to.
    pub fn login_url(next: &str) -> String {
        // Slashes stay readable in the query string
        let next = urlencoding::encode(next).replace("%2F", "/");
        format!("/login/?next={next}")
    }

    fn page(&self) -> (&'static str, String) {
        match self {
            WebError::NotFound => (
                "Page not found",
                "The page you requested could not be found.".to_string(),
            ),
            WebError::Forbidden(reason) => ("Forbidden", reason.clone()),
            WebError::BadRequest(reason) => ("Bad request", reason.clone()),
            WebError::TooManyRequests => (
                "Too many requests",
                "Too many requests. Please try again later.".to_string(),
            ),
            WebError::LoginRequired { .. } => ("Login required", String::new()),
            WebError::Internal(_) => (
                "Server error",
                "Something went wrong. Please try again later.".to_string(),
            ),
        }
    }
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebError::NotFound => write!(f, "not found"),
            WebError::Forbidden(reason) => write!(f, "forbidden: {reason}"),
            WebError::BadRequest(reason) => write!(f, "bad request: {reason}"),
            WebError::TooManyRequests => write!(f, "too many requests"),
            WebError::LoginRequired { next } => write!(f, "login required for {next}"),
            WebError::Internal(reason) => write!(f, "internal error: {reason}"),
        }
    }
}

impl std::error::Error for WebError {}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        if let WebError::LoginRequired { next } = &self {
            return Redirect::to(&Self::login_url(next)).into_response();
        }

        let status = self.status_code();
        let (title, message) = self.page();
        let body = format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\">\
             <title>{title}</title>\
             <link rel=\"stylesheet\" href=\"/static/css/app.css\"></head>\n\
             <body><div class=\"container\"><h1>{title}</h1><p>{message}</p>\
             <p><a href=\"/\">Back to the boards</a></p></div></body>\n</html>\n",
            title = escape_html(title),
            message = escape_html(&message),
        );

        (status, Html(body)).into_response()
    }
}

impl From<ForumError> for WebError {
    fn from(err: ForumError) -> Self {
        match err {
            ForumError::NotFound(_) => WebError::NotFound,
            ForumError::Validation(msg) => WebError::BadRequest(msg),
            other => {
                error!(error = %other, "Request failed");
                WebError::Internal(other.to_string())
            }
        }
    }
}

impl From<crate::template::TemplateError> for WebError {
    fn from(err: crate::template::TemplateError) -> Self {
        ForumError::from(err).into()
    }
}

/// Result type for handlers.
pub type WebResult<T> = std::result::Result<T, WebError>;
