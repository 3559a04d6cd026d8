//! Shared application state.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::auth::{LoginLimiter, ResetTokenGenerator, SessionManager};
use crate::config::Config;
use crate::db::Database;
use crate::i18n::I18n;
use crate::mail::{self, Mailer};
use crate::template::{TemplateEngine, TemplateLoader};
use crate::Result;

use super::form_tags;
use super::middleware::RateLimitState;

/// State shared by every request handler.
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub templates: Arc<TemplateEngine>,
    pub i18n: Arc<I18n>,
    pub sessions: Mutex<SessionManager>,
    pub mailer: Arc<dyn Mailer>,
    pub tokens: ResetTokenGenerator,
    pub rate_limit: RateLimitState,
}

impl AppState {
    /// Assemble the state from already loaded parts.
    pub fn new(
        config: Arc<Config>,
        db: Database,
        templates: Arc<TemplateEngine>,
        i18n: Arc<I18n>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let limiter = LoginLimiter::with_config(
            config.session.max_login_attempts,
            config.session.lockout_secs,
            config.session.lockout_secs,
        );
        let sessions = SessionManager::new(config.session.duration_secs, limiter);
        let tokens = ResetTokenGenerator::new(
            &config.server.secret_key,
            config.forum.password_reset_timeout_secs,
        );
        let rate_limit = RateLimitState::new(config.server.auth_rate_limit);

        Self {
            db,
            config,
            templates,
            i18n,
            sessions: Mutex::new(sessions),
            mailer,
            tokens,
            rate_limit,
        }
    }

    /// Load templates, the locale catalogue and the mailer named by `config`.
    pub fn from_config(config: Arc<Config>, db: Database) -> Result<Self> {
        let mut templates = TemplateLoader::new(&config.templates.path).load_engine()?;
        form_tags::register(&mut templates);
        info!(
            count = templates.template_names().len(),
            path = %config.templates.path,
            "Templates loaded"
        );

        let i18n = I18n::load(&config.locale.language, &config.locale.path)?;
        let mailer = mail::from_config(&config.mail)?;

        Ok(Self::new(
            config,
            db,
            Arc::new(templates),
            Arc::new(i18n),
            mailer,
        ))
    }

    /// Topics per page as a query limit.
    pub fn topics_per_page(&self) -> i64 {
        i64::from(self.config.forum.topics_per_page)
    }

    /// Posts per page as a query limit.
    pub fn posts_per_page(&self) -> i64 {
        i64::from(self.config.forum.posts_per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::MemoryMailer;

    #[tokio::test]
    async fn test_new_uses_config_limits() {
        let mut config = Config::default();
        config.server.secret_key = "secret".to_string();
        config.forum.posts_per_page = 3;

        let db = Database::open_in_memory().await.unwrap();
        let state = AppState::new(
            Arc::new(config),
            db,
            Arc::new(TemplateEngine::new()),
            Arc::new(I18n::default()),
            Arc::new(MemoryMailer::new()),
        );

        assert_eq!(state.posts_per_page(), 3);
        assert_eq!(state.topics_per_page(), 20);
        assert_eq!(state.sessions.lock().await.session_count(), 0);
    }

    #[tokio::test]
    async fn test_from_config_loads_bundled_assets() {
        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
        let mut config = Config::default();
        config.server.secret_key = "secret".to_string();
        config.templates.path = root.join("templates").to_string_lossy().to_string();
        config.locale.path = root.join("locales").to_string_lossy().to_string();

        let db = Database::open_in_memory().await.unwrap();
        let state = AppState::from_config(Arc::new(config), db).unwrap();

        assert!(state.templates.has_template("base.html"));
        assert!(state.templates.has_template("mail/password_reset_email.txt"));
        assert!(state.i18n.has_key("reset.invalid_link"));
    }
}
