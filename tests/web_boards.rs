//! Home page and board topic listing.

mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn test_home_lists_boards() {
    let app = TestApp::new().await;
    let board = app.create_board("Django", "Django board.").await;

    let response = app.server.get("/").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();
    assert!(html.contains(&format!(r#"href="/boards/{}/""#, board.id)));
    assert!(html.contains("Django board."));
    assert!(html.contains("No posts yet."));
}

#[tokio::test]
async fn test_home_shows_board_statistics() {
    let app = TestApp::new().await;
    let board = app.create_board("Django", "Django board.").await;
    let user = app.create_user("john", "john@mail.com", "abcdef123456").await;
    app.create_topic(&board, "Hello, everyone!", &user).await;

    let html = app.server.get("/").await.text();

    assert!(html.contains("By john at"));
    assert!(!html.contains("No posts yet."));
}

#[tokio::test]
async fn test_home_escapes_board_names() {
    let app = TestApp::new().await;
    app.create_board("<b>Bold</b>", "").await;

    let html = app.server.get("/").await.text();

    assert!(html.contains("&lt;b&gt;Bold&lt;/b&gt;"));
    assert!(!html.contains("<b>Bold</b>"));
}

#[tokio::test]
async fn test_home_sets_csrf_cookie_and_security_headers() {
    let app = TestApp::new().await;

    let response = app.server.get("/").await;

    let cookies: Vec<_> = response.headers().get_all("set-cookie").iter().collect();
    assert!(cookies
        .iter()
        .any(|c| c.to_str().unwrap().starts_with("csrftoken=")));
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn test_board_topics_success() {
    let app = TestApp::new().await;
    let board = app.create_board("Django", "Django board.").await;

    let response = app.server.get(&format!("/boards/{}/", board.id)).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();
    assert!(html.contains(r#"href="/""#));
    assert!(html.contains(&format!(r#"href="/boards/{}/new/""#, board.id)));
    assert!(html.contains("There are no topics in this board yet."));
}

#[tokio::test]
async fn test_board_topics_not_found() {
    let app = TestApp::new().await;

    let response = app.server.get("/boards/99/").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_board_topics_non_numeric_id() {
    let app = TestApp::new().await;

    let response = app.server.get("/boards/abc/").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_board_topics_lists_topics_with_counts() {
    let app = TestApp::new().await;
    let board = app.create_board("Django", "").await;
    let user = app.create_user("john", "john@mail.com", "abcdef123456").await;
    let topic = app.create_topic(&board, "Hello, everyone!", &user).await;

    let html = app.server.get(&format!("/boards/{}/", board.id)).await.text();

    assert!(html.contains(&format!(
        r#"href="/boards/{}/topics/{}/""#,
        board.id, topic.id
    )));
    assert!(html.contains("Hello, everyone!"));
    assert!(html.contains("john"));
}

#[tokio::test]
async fn test_board_topics_pagination() {
    let app = TestApp::new().await;
    let board = app.create_board("Django", "").await;
    let user = app.create_user("john", "john@mail.com", "abcdef123456").await;
    for i in 0..25 {
        app.create_topic(&board, &format!("Topic {i}"), &user).await;
    }
    let topic_link = format!(r#"href="/boards/{}/topics/"#, board.id);
    let url = format!("/boards/{}/", board.id);

    let first = app.server.get(&url).await.text();
    assert_eq!(first.matches(&topic_link).count(), 20);
    assert!(first.contains("Page 1 of 2"));
    assert!(first.contains(r#"href="?page=2""#));

    let second = app.server.get(&url).add_query_param("page", 2).await.text();
    assert_eq!(second.matches(&topic_link).count(), 5);
    assert!(second.contains("Page 2 of 2"));
}

#[tokio::test]
async fn test_board_topics_invalid_page_falls_back() {
    let app = TestApp::new().await;
    let board = app.create_board("Django", "").await;
    let user = app.create_user("john", "john@mail.com", "abcdef123456").await;
    for i in 0..25 {
        app.create_topic(&board, &format!("Topic {i}"), &user).await;
    }
    let url = format!("/boards/{}/", board.id);

    let not_a_number = app.server.get(&url).add_query_param("page", "abc").await;
    assert_eq!(not_a_number.status_code(), StatusCode::OK);
    assert!(not_a_number.text().contains("Page 1 of 2"));

    let past_the_end = app.server.get(&url).add_query_param("page", 99).await;
    assert_eq!(past_the_end.status_code(), StatusCode::OK);
    assert!(past_the_end.text().contains("Page 2 of 2"));
}
