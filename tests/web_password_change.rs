//! Password change for logged-in users.

mod common;

use axum::http::StatusCode;
use common::{location, TestApp};
use forum::{verify_password, User, UserRepository};

async fn logged_in_app() -> (TestApp, User) {
    let app = TestApp::new().await;
    let user = app.create_user("john", "john@mail.com", "old_password").await;
    app.login("john", "old_password").await;
    (app, user)
}

async fn reload(app: &TestApp, user: &User) -> User {
    UserRepository::new(app.state.db.pool())
        .get_by_id(user.id)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_password_change_requires_login() {
    let app = TestApp::new().await;

    let response = app.server.get("/settings/password/").await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/?next=/settings/password/");
}

#[tokio::test]
async fn test_password_change_page() {
    let (app, _) = logged_in_app().await;

    let response = app.server.get("/settings/password/").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();
    assert!(html.contains("csrfmiddlewaretoken"));
    assert_eq!(html.matches("<input").count(), 4);
    assert_eq!(html.matches(r#"type="password""#).count(), 3);
}

#[tokio::test]
async fn test_password_change_success() {
    let (app, user) = logged_in_app().await;

    let response = app
        .post_form(
            "/settings/password/",
            &[
                ("old_password", "old_password"),
                ("new_password1", "new_password"),
                ("new_password2", "new_password"),
            ],
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/settings/password/done/");

    let user = reload(&app, &user).await;
    assert!(verify_password("new_password", &user.password).is_ok());

    // The session that changed the password stays logged in
    let done = app.server.get("/settings/password/done/").await;
    assert_eq!(done.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_password_change_ends_other_sessions() {
    let (app, user) = logged_in_app().await;
    let other = app.state.sessions.lock().await.start(user.id);

    app.post_form(
        "/settings/password/",
        &[
            ("old_password", "old_password"),
            ("new_password1", "new_password"),
            ("new_password2", "new_password"),
        ],
    )
    .await;

    let mut sessions = app.state.sessions.lock().await;
    assert!(sessions.get_session(&other.token).is_err());
    assert_eq!(sessions.user_session_count(user.id), 1);
}

#[tokio::test]
async fn test_password_change_wrong_old_password() {
    let (app, user) = logged_in_app().await;

    let response = app
        .post_form(
            "/settings/password/",
            &[
                ("old_password", "wrong_password"),
                ("new_password1", "new_password"),
                ("new_password2", "new_password"),
            ],
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response
        .text()
        .contains("Your old password was entered incorrectly."));

    let user = reload(&app, &user).await;
    assert!(verify_password("old_password", &user.password).is_ok());
}

#[tokio::test]
async fn test_password_change_mismatch() {
    let (app, user) = logged_in_app().await;

    let response = app
        .post_form(
            "/settings/password/",
            &[
                ("old_password", "old_password"),
                ("new_password1", "new_password"),
                ("new_password2", "invalid_password"),
            ],
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("is-invalid"));

    let user = reload(&app, &user).await;
    assert!(verify_password("old_password", &user.password).is_ok());
}

#[tokio::test]
async fn test_password_change_empty_form() {
    let (app, _) = logged_in_app().await;

    let response = app.post_form("/settings/password/", &[]).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.text().matches("This field is required.").count(),
        3
    );
}
