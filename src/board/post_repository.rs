//! Post repository.

use sqlx::SqliteConnection;

use super::post::{NewPost, Post, PostView};
use crate::db::DbPool;
use crate::{ForumError, Result};

const COUNT_BY_TOPIC: &str = "SELECT COUNT(*) FROM posts WHERE topic_id = ?";

const POST_VIEW_SELECT: &str = "SELECT p.id, p.message, p.created_at, p.updated_at,
        u.id AS author_id, u.username AS author_username,
        (SELECT COUNT(*) FROM posts q WHERE q.created_by = u.id) AS author_post_count
 FROM posts p
 JOIN users u ON u.id = p.created_by";

/// Repository for post CRUD operations.
pub struct PostRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PostRepository<'a> {
    /// Create a new PostRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a post on `conn` and return its ID.
    pub async fn insert(conn: &mut SqliteConnection, new_post: &NewPost) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (message, topic_id, created_by) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&new_post.message)
        .bind(new_post.topic_id)
        .bind(new_post.created_by)
        .fetch_one(conn)
        .await
        .map_err(|e| ForumError::Database(e.to_string()))?;
        Ok(id)
    }

    /// Count posts in a topic on `conn`.
    pub async fn count_in_topic(conn: &mut SqliteConnection, topic_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(COUNT_BY_TOPIC)
            .bind(topic_id)
            .fetch_one(conn)
            .await
            .map_err(|e| ForumError::Database(e.to_string()))?;
        Ok(count.0)
    }

    /// Get a post by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT id, message, topic_id, created_by, created_at, updated_by, updated_at
             FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ForumError::Database(e.to_string()))?;

        Ok(post)
    }

    /// List a page of a topic's posts in chronological order.
    pub async fn list_by_topic_paginated(
        &self,
        topic_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PostView>> {
        let sql = format!(
            "{POST_VIEW_SELECT}
             WHERE p.topic_id = ?
             ORDER BY p.created_at ASC, p.id ASC
             LIMIT ? OFFSET ?"
        );
        let posts = sqlx::query_as::<_, PostView>(&sql)
            .bind(topic_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await
            .map_err(|e| ForumError::Database(e.to_string()))?;

        Ok(posts)
    }

    /// List the most recent posts of a topic, newest first.
    pub async fn list_recent_by_topic(&self, topic_id: i64, limit: i64) -> Result<Vec<PostView>> {
        let sql = format!(
            "{POST_VIEW_SELECT}
             WHERE p.topic_id = ?
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT ?"
        );
        let posts = sqlx::query_as::<_, PostView>(&sql)
            .bind(topic_id)
            .bind(limit)
            .fetch_all(self.pool)
            .await
            .map_err(|e| ForumError::Database(e.to_string()))?;

        Ok(posts)
    }

    /// Count posts in a topic.
    pub async fn count_by_topic(&self, topic_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(COUNT_BY_TOPIC)
            .bind(topic_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| ForumError::Database(e.to_string()))?;
        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardRepository, BoardService, NewBoard, NewTopic};
    use crate::db::{NewUser, UserRepository};
    use crate::Database;

    #[tokio::test]
    async fn test_posts_in_topic() {
        let db = Database::open_in_memory().await.unwrap();
        let board = BoardRepository::new(db.pool())
            .create(&NewBoard::new("Django"))
            .await
            .unwrap();
        let users = UserRepository::new(db.pool());
        let john = users.create(&NewUser::new("john", "pw")).await.unwrap();
        let jane = users.create(&NewUser::new("jane", "pw")).await.unwrap();
        let topic = BoardService::new(&db)
            .create_topic(&NewTopic::new(board.id, "Hello", "one", john.id))
            .await
            .unwrap();

        let repo = PostRepository::new(db.pool());
        let reply_id = {
            let mut conn = db.pool().acquire().await.unwrap();
            let id = PostRepository::insert(&mut conn, &NewPost::new(topic.id, "two", jane.id))
                .await
                .unwrap();
            PostRepository::insert(&mut conn, &NewPost::new(topic.id, "three", john.id))
                .await
                .unwrap();
            id
        };

        let reply = repo.get_by_id(reply_id).await.unwrap().unwrap();

        assert_eq!(reply.created_by, jane.id);
        assert!(reply.updated_at.is_none());
        assert_eq!(repo.count_by_topic(topic.id).await.unwrap(), 3);

        let page = repo.list_by_topic_paginated(topic.id, 0, 2).await.unwrap();
        let messages: Vec<_> = page.iter().map(|p| p.message.as_str()).collect();
        assert_eq!(messages, ["one", "two"]);
        assert_eq!(page[0].author_username, "john");
        assert_eq!(page[0].author_post_count, 2);
        assert_eq!(page[1].author_post_count, 1);

        let recent = repo.list_recent_by_topic(topic.id, 2).await.unwrap();
        let messages: Vec<_> = recent.iter().map(|p| p.message.as_str()).collect();
        assert_eq!(messages, ["three", "two"]);
    }

    #[tokio::test]
    async fn test_post_requires_existing_topic() {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("john", "pw"))
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let orphan = NewPost::new(42, "orphan", user.id);
        let result = PostRepository::insert(&mut conn, &orphan).await;
        assert!(matches!(result, Err(ForumError::Database(_))));
        assert_eq!(PostRepository::count_in_topic(&mut conn, 42).await.unwrap(), 0);
    }
}
