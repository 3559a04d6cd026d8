//! Topic model.

use serde::Serialize;

/// Maximum topic subject length (in characters).
pub const MAX_SUBJECT_LENGTH: usize = 255;

/// Topic entity: a discussion thread in a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Topic {
    pub id: i64,
    pub subject: String,
    pub board_id: i64,
    /// User who opened the topic.
    pub starter_id: i64,
    /// Number of times the post list was viewed.
    pub views: i64,
    /// Time of the latest reply, or of creation.
    pub last_updated: String,
}

/// Data for creating a new topic together with its opening post.
#[derive(Debug, Clone)]
pub struct NewTopic {
    pub board_id: i64,
    pub subject: String,
    /// Body of the opening post.
    pub message: String,
    pub starter_id: i64,
}

impl NewTopic {
    pub fn new(
        board_id: i64,
        subject: impl Into<String>,
        message: impl Into<String>,
        starter_id: i64,
    ) -> Self {
        Self {
            board_id,
            subject: subject.into(),
            message: message.into(),
            starter_id,
        }
    }
}

/// A topic row as listed on a board page.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopicSummary {
    pub id: i64,
    pub board_id: i64,
    pub subject: String,
    pub starter_username: String,
    pub views: i64,
    pub last_updated: String,
    /// Posts after the opening one.
    pub replies: i64,
}
