//! Topic repository.

use sqlx::SqliteConnection;

use super::topic::{NewTopic, Topic, TopicSummary};
use crate::db::{DbPool, SQL_NOW};
use crate::{ForumError, Result};

/// Repository for topic queries and bookkeeping updates.
///
/// Writes take a connection instead of the pool so that they can run inside
/// the transaction of [`BoardService`](super::BoardService).
pub struct TopicRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> TopicRepository<'a> {
    /// Create a new TopicRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Get a topic by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Topic>> {
        let topic = sqlx::query_as::<_, Topic>(
            "SELECT id, subject, board_id, starter_id, views, last_updated
             FROM topics WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ForumError::Database(e.to_string()))?;

        Ok(topic)
    }

    /// Get a topic by ID, only if it belongs to `board_id`.
    pub async fn get_in_board(&self, board_id: i64, id: i64) -> Result<Option<Topic>> {
        let topic = sqlx::query_as::<_, Topic>(
            "SELECT id, subject, board_id, starter_id, views, last_updated
             FROM topics WHERE id = ? AND board_id = ?",
        )
        .bind(id)
        .bind(board_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ForumError::Database(e.to_string()))?;

        Ok(topic)
    }

    /// List topics of a board, most recently updated first.
    pub async fn list_by_board_paginated(
        &self,
        board_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<TopicSummary>> {
        let topics = sqlx::query_as::<_, TopicSummary>(
            "SELECT t.id, t.board_id, t.subject, u.username AS starter_username,
                    t.views, t.last_updated,
                    (SELECT COUNT(*) FROM posts p WHERE p.topic_id = t.id) - 1 AS replies
             FROM topics t
             JOIN users u ON u.id = t.starter_id
             WHERE t.board_id = ?
             ORDER BY t.last_updated DESC, t.id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(board_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await
        .map_err(|e| ForumError::Database(e.to_string()))?;

        Ok(topics)
    }

    /// Count topics in a board.
    pub async fn count_by_board(&self, board_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM topics WHERE board_id = ?")
            .bind(board_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| ForumError::Database(e.to_string()))?;
        Ok(count.0)
    }

    /// Add one to the view counter.
    pub async fn increment_views(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE topics SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| ForumError::Database(e.to_string()))?;
        Ok(())
    }

    /// Insert a topic row and return its ID.
    ///
    /// The opening post is not written here.
    pub async fn insert(conn: &mut SqliteConnection, new_topic: &NewTopic) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO topics (subject, board_id, starter_id) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&new_topic.subject)
        .bind(new_topic.board_id)
        .bind(new_topic.starter_id)
        .fetch_one(conn)
        .await
        .map_err(|e| ForumError::Database(e.to_string()))?;
        Ok(id)
    }

    /// Set `last_updated` to now.
    pub async fn touch(conn: &mut SqliteConnection, id: i64) -> Result<()> {
        let sql = format!("UPDATE topics SET last_updated = {SQL_NOW} WHERE id = ?");
        sqlx::query(&sql)
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| ForumError::Database(e.to_string()))?;
        Ok(())
    }
}
