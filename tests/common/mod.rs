//! Test helpers for the web integration tests.
//!
//! `TestApp` runs the full router against an in-memory database, the bundled
//! templates and locale, and a memory mailer. Cookies persist across
//! requests, so a test behaves like one browser.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum_test::{TestResponse, TestServer};

use forum::board::{Board, BoardRepository, BoardService, NewBoard, NewTopic, Topic};
use forum::config::{Config, MailBackend};
use forum::i18n::I18n;
use forum::mail::MemoryMailer;
use forum::template::TemplateLoader;
use forum::web::{create_router, form_tags, AppState};
use forum::{hash_password, Database, NewUser, User, UserRepository};

pub const SITE_URL: &str = "http://testserver";

/// A running application with one cookie-keeping client.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub mailer: Arc<MemoryMailer>,
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.server.site_url = SITE_URL.to_string();
    config.server.secret_key = "test-secret-key-for-testing-only".to_string();
    config.server.serve_static = false;
    config.server.auth_rate_limit = 1000;
    config.mail.backend = MailBackend::Memory;
    config.forum.name = "Django Boards".to_string();
    config
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"));

        let mut templates = TemplateLoader::new(root.join("templates"))
            .load_engine()
            .expect("Failed to load templates");
        form_tags::register(&mut templates);
        let i18n = I18n::load("en", root.join("locales")).expect("Failed to load locale");

        let db = Database::open_in_memory()
            .await
            .expect("Failed to create test database");
        let mailer = Arc::new(MemoryMailer::new());

        let state = Arc::new(AppState::new(
            Arc::new(config),
            db,
            Arc::new(templates),
            Arc::new(i18n),
            mailer.clone(),
        ));

        let server = TestServer::builder()
            .save_cookies()
            .build(create_router(state.clone()))
            .expect("Failed to create test server");

        Self {
            server,
            state,
            mailer,
        }
    }

    /// Create an active user with a hashed password.
    pub async fn create_user(&self, username: &str, email: &str, password: &str) -> User {
        let hash = hash_password(password).unwrap();
        UserRepository::new(self.state.db.pool())
            .create(&NewUser::new(username, hash).with_email(email))
            .await
            .unwrap()
    }

    pub async fn create_board(&self, name: &str, description: &str) -> Board {
        BoardRepository::new(self.state.db.pool())
            .create(&NewBoard::new(name).with_description(description))
            .await
            .unwrap()
    }

    pub async fn create_topic(&self, board: &Board, subject: &str, starter: &User) -> Topic {
        let new_topic =
            NewTopic::new(board.id, subject, "Lorem ipsum dolor sit amet", starter.id);
        BoardService::new(&self.state.db)
            .create_topic(&new_topic)
            .await
            .unwrap()
    }

    /// Fetch a page and return the CSRF token it carries.
    pub async fn csrf_token(&self) -> String {
        let html = self.server.get("/login/").await.text();
        extract_csrf(&html).expect("page carries no CSRF token")
    }

    /// Submit a form the way a browser would, with the CSRF token.
    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let token = self.csrf_token().await;
        let mut data: Vec<(&str, &str)> = vec![("csrfmiddlewaretoken", token.as_str())];
        data.extend_from_slice(fields);
        self.server.post(path).form(&data).await
    }

    pub async fn login(&self, username: &str, password: &str) {
        let response = self
            .post_form("/login/", &[("username", username), ("password", password)])
            .await;
        assert_eq!(location(&response), "/", "login as {username} failed");
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(self.state.db.pool())
            .await
            .unwrap()
    }
}

/// `Location` header of a redirect.
pub fn location(response: &TestResponse) -> String {
    response
        .headers()
        .get("location")
        .expect("response is not a redirect")
        .to_str()
        .unwrap()
        .to_string()
}

/// The value of the first `csrfmiddlewaretoken` field in a page.
pub fn extract_csrf(html: &str) -> Option<String> {
    let marker = r#"name="csrfmiddlewaretoken" value=""#;
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('"')? + start;
    Some(html[start..end].to_string())
}
