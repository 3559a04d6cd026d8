//! Rate limiting middleware.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, RwLock},
};

use crate::web::error::WebError;
use crate::web::state::AppState;

/// Per-IP rate limiter using Governor.
pub type IpRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-IP limiters for authentication form submissions.
#[derive(Clone)]
pub struct RateLimitState {
    limiters: Arc<RwLock<HashMap<String, Arc<IpRateLimiter>>>>,
    /// Allowed submissions per minute and IP.
    requests_per_minute: u32,
}

impl RateLimitState {
    /// Create a new rate limit state.
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            limiters: Arc::new(RwLock::new(HashMap::new())),
            requests_per_minute,
        }
    }

    fn limiter_for(&self, ip: &str) -> Arc<IpRateLimiter> {
        {
            let read_guard = self
                .limiters
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(limiter) = read_guard.get(ip) {
                return limiter.clone();
            }
        }

        let mut write_guard = self
            .limiters
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Another request may have inserted it meanwhile
        if let Some(limiter) = write_guard.get(ip) {
            return limiter.clone();
        }

        let quota =
            Quota::per_minute(NonZeroU32::new(self.requests_per_minute).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        write_guard.insert(ip.to_string(), limiter.clone());
        limiter
    }

    /// Check whether a submission from `ip` is allowed.
    pub fn check(&self, ip: &str) -> bool {
        self.limiter_for(ip).check().is_ok()
    }

    /// Number of tracked IPs.
    pub fn tracked(&self) -> usize {
        self.limiters
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Drop limiters that are not in use (call periodically).
    pub fn cleanup(&self) {
        self.limiters
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .retain(|_, v| Arc::strong_count(v) > 1);
    }
}

/// Extract client IP from request.
pub fn get_client_ip(req: &Request) -> String {
    // Reverse proxy headers first
    if let Some(forwarded) = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(ip) = forwarded.split(',').next() {
            return ip.trim().to_string();
        }
    }

    if let Some(real_ip) = req
        .headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
    {
        return real_ip.to_string();
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Limit POST submissions to login, signup and password reset per IP.
pub async fn auth_rate_limit(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() == Method::POST {
        let ip = get_client_ip(&req);

        if !state.rate_limit.check(&ip) {
            tracing::warn!(ip = %ip, path = %req.uri().path(), "Auth rate limit exceeded");
            return WebError::TooManyRequests.into_response();
        }
    }

    next.run(req).await
}
