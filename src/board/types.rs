//! Board model.

use serde::Serialize;

/// Maximum board name length (in characters).
pub const MAX_BOARD_NAME_LENGTH: usize = 30;

/// Maximum board description length (in characters).
pub const MAX_BOARD_DESCRIPTION_LENGTH: usize = 100;

/// Board entity: a named category of topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Board {
    pub id: i64,
    /// Board name (unique).
    pub name: String,
    pub description: String,
}

/// Data for creating a new board.
#[derive(Debug, Clone)]
pub struct NewBoard {
    pub name: String,
    pub description: String,
}

impl NewBoard {
    /// Create a new board with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A board together with the figures shown on the home page.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BoardSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub topic_count: i64,
    pub post_count: i64,
    /// Creation time of the most recent post in the board.
    pub last_post_at: Option<String>,
    /// Author of the most recent post in the board.
    pub last_post_by: Option<String>,
}
