//! Post model.

use serde::Serialize;

/// Maximum post message length (in characters).
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// Post entity: a single message in a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub message: String,
    pub topic_id: i64,
    pub created_by: i64,
    pub created_at: String,
    pub updated_by: Option<i64>,
    pub updated_at: Option<String>,
}

/// Data for creating a reply in a topic.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub topic_id: i64,
    pub message: String,
    pub created_by: i64,
}

impl NewPost {
    pub fn new(topic_id: i64, message: impl Into<String>, created_by: i64) -> Self {
        Self {
            topic_id,
            message: message.into(),
            created_by,
        }
    }
}

/// A post joined with what the topic page shows about its author.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PostView {
    pub id: i64,
    pub message: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub author_id: i64,
    pub author_username: String,
    /// Total posts written by the author.
    pub author_post_count: i64,
}
