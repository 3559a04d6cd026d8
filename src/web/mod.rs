//! Web frontend.
//!
//! Server-rendered HTML pages over axum: boards, topics and posts, account
//! management and the password reset flow.

pub mod csrf;
pub mod error;
pub mod form_tags;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod render;
pub mod router;
pub mod server;
pub mod state;

pub use error::{WebError, WebResult};
pub use router::create_router;
pub use server::WebServer;
pub use state::AppState;
