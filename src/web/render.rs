//! Page rendering.
//!
//! Every HTML page is a template rendered inside `base.html` with a common
//! context: the site name, the CSRF token and the logged-in user.

use axum::response::Html;
use serde::Serialize;

use crate::board::PageInfo;
use crate::db::User;
use crate::template::{TemplateContext, Value};

use super::csrf::CsrfToken;
use super::error::WebResult;
use super::forms::FormView;
use super::middleware::CurrentUser;
use super::state::AppState;

const LAYOUT: &str = "base.html";

/// The logged-in user as seen by templates.
#[derive(Debug, Serialize)]
struct UserView<'a> {
    id: i64,
    username: &'a str,
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    display_name: String,
}

impl<'a> From<&'a User> for UserView<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: user.id,
            username: &user.username,
            email: &user.email,
            first_name: &user.first_name,
            last_name: &user.last_name,
            display_name: user.display_name(),
        }
    }
}

/// Pager links for a paginated listing.
#[derive(Debug, Serialize)]
pub struct PaginationView {
    pub number: i64,
    pub num_pages: i64,
    pub has_other_pages: bool,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous: i64,
    pub next: i64,
}

impl From<&PageInfo> for PaginationView {
    fn from(page: &PageInfo) -> Self {
        Self {
            number: page.number,
            num_pages: page.num_pages,
            has_other_pages: page.has_other_pages(),
            has_previous: page.has_previous(),
            has_next: page.has_next(),
            previous: (page.number - 1).max(1),
            next: (page.number + 1).min(page.num_pages),
        }
    }
}

/// A page under construction.
pub struct Page<'a> {
    state: &'a AppState,
    template: &'static str,
    context: TemplateContext,
}

impl<'a> Page<'a> {
    pub fn new(
        state: &'a AppState,
        template: &'static str,
        current: &CurrentUser,
        csrf: &CsrfToken,
    ) -> WebResult<Self> {
        let mut context = TemplateContext::new(state.i18n.clone());
        context.set("site_name", Value::string(&state.config.forum.name));
        context.set("csrf_token", Value::string(csrf.as_str()));
        if let Some(user) = &current.user {
            context.insert("user", &UserView::from(user))?;
        }

        Ok(Self {
            state,
            template,
            context,
        })
    }

    /// Set the page title from a catalogue key.
    pub fn title(mut self, key: &str) -> Self {
        let title = self.state.i18n.t(key).to_string();
        self.context.set("title", Value::String(title));
        self
    }

    /// Set the page title to literal text.
    pub fn title_text(mut self, title: impl Into<String>) -> Self {
        self.context.set("title", Value::String(title.into()));
        self
    }

    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.context.set(name, value.into());
        self
    }

    pub fn insert<T: Serialize + ?Sized>(mut self, name: &str, value: &T) -> WebResult<Self> {
        self.context.insert(name, value)?;
        Ok(self)
    }

    pub fn form(self, form: &FormView) -> WebResult<Self> {
        self.insert("form", form)
    }

    pub fn pagination(self, page: &PageInfo) -> WebResult<Self> {
        self.insert("pagination", &PaginationView::from(page))
    }

    pub fn render(self) -> WebResult<Html<String>> {
        let html = self
            .state
            .templates
            .render_in_layout(LAYOUT, self.template, &self.context)?;
        Ok(Html(html))
    }
}
