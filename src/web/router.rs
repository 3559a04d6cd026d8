//! Router configuration.

use axum::{
    http::{header::CACHE_CONTROL, HeaderValue},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, services::ServeDir, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use super::csrf::csrf_cookie;
use super::error::WebError;
use super::handlers::{
    board_topics, home, login, login_form, logout, my_account, my_account_form, new_topic,
    new_topic_form, password_change, password_change_done, password_change_form,
    password_reset, password_reset_complete, password_reset_confirm,
    password_reset_confirm_form, password_reset_done, password_reset_form, reply_form,
    reply_topic, signup, signup_form, topic_posts,
};
use super::middleware::{auth_rate_limit, security_headers};
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Credential submissions are rate limited per IP
    let auth_routes = Router::new()
        .route("/signup/", get(signup_form).post(signup))
        .route("/login/", get(login_form).post(login))
        .route("/reset/", get(password_reset_form).post(password_reset))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_rate_limit,
        ));

    let board_routes = Router::new()
        .route("/", get(home))
        .route("/boards/:board_id/", get(board_topics))
        .route("/boards/:board_id/new/", get(new_topic_form).post(new_topic))
        .route("/boards/:board_id/topics/:topic_id/", get(topic_posts))
        .route(
            "/boards/:board_id/topics/:topic_id/reply/",
            get(reply_form).post(reply_topic),
        );

    let account_routes = Router::new()
        .route("/logout/", post(logout))
        .route("/reset/done/", get(password_reset_done))
        .route(
            "/reset/:uidb64/:token/",
            get(password_reset_confirm_form).post(password_reset_confirm),
        )
        .route("/reset/complete/", get(password_reset_complete))
        .route(
            "/settings/password/",
            get(password_change_form).post(password_change),
        )
        .route("/settings/password/done/", get(password_change_done))
        .route("/settings/account/", get(my_account_form).post(my_account));

    let pages = Router::new()
        .merge(board_routes)
        .merge(account_routes)
        .merge(auth_routes)
        .layer(middleware::from_fn_with_state(state.clone(), csrf_cookie))
        .layer(middleware::from_fn(security_headers));

    let mut router = Router::new()
        .route("/health", get(health_check))
        .merge(pages);

    if state.config.server.serve_static {
        let static_files = ServiceBuilder::new()
            .layer(SetResponseHeaderLayer::if_not_present(
                CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=3600"),
            ))
            .service(ServeDir::new(&state.config.server.static_path));
        router = router.nest_service("/static", static_files);
    }

    router
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(state)
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

async fn not_found() -> impl IntoResponse {
    WebError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::Database;
    use crate::i18n::I18n;
    use crate::mail::MemoryMailer;
    use crate::template::TemplateEngine;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    async fn test_router() -> Router {
        let mut config = Config::default();
        config.server.secret_key = "test-secret".to_string();
        config.server.serve_static = false;

        let state = AppState::new(
            Arc::new(config),
            Database::open_in_memory().await.unwrap(),
            Arc::new(TemplateEngine::new()),
            Arc::new(I18n::default()),
            Arc::new(MemoryMailer::new()),
        );
        create_router(Arc::new(state))
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = test_router()
            .await
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_static_files_are_cacheable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.css"), "body {}").unwrap();

        let mut config = Config::default();
        config.server.secret_key = "test-secret".to_string();
        config.server.static_path = dir.path().to_string_lossy().to_string();
        let state = AppState::new(
            Arc::new(config),
            Database::open_in_memory().await.unwrap(),
            Arc::new(TemplateEngine::new()),
            Arc::new(I18n::default()),
            Arc::new(MemoryMailer::new()),
        );

        let response = create_router(Arc::new(state))
            .oneshot(
                Request::builder()
                    .uri("/static/app.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("cache-control").unwrap(),
            "public, max-age=3600"
        );
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let response = test_router()
            .await
            .oneshot(
                Request::builder()
                    .uri("/no/such/page/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_protected_page_redirects_to_login() {
        let response = test_router()
            .await
            .oneshot(
                Request::builder()
                    .uri("/settings/password/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            "/login/?next=/settings/password/"
        );
        assert!(response.headers().get("set-cookie").is_some());
    }
}
