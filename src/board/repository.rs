//! Board repository.
//!
//! This module provides CRUD operations for boards in the database.

use super::types::{Board, BoardSummary, NewBoard};
use crate::db::DbPool;
use crate::{ForumError, Result};

/// Repository for board CRUD operations.
pub struct BoardRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> BoardRepository<'a> {
    /// Create a new BoardRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new board in the database.
    ///
    /// Returns the created board with the assigned ID.
    pub async fn create(&self, new_board: &NewBoard) -> Result<Board> {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO boards (name, description) VALUES (?, ?) RETURNING id")
                .bind(&new_board.name)
                .bind(&new_board.description)
                .fetch_one(self.pool)
                .await
                .map_err(|e| ForumError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| ForumError::NotFound("board".to_string()))
    }

    /// Get a board by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Board>> {
        let board = sqlx::query_as::<_, Board>(
            "SELECT id, name, description FROM boards WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ForumError::Database(e.to_string()))?;

        Ok(board)
    }

    /// Get a board by its exact name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Board>> {
        let board = sqlx::query_as::<_, Board>(
            "SELECT id, name, description FROM boards WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ForumError::Database(e.to_string()))?;

        Ok(board)
    }

    /// List all boards ordered by name.
    pub async fn list(&self) -> Result<Vec<Board>> {
        let boards =
            sqlx::query_as::<_, Board>("SELECT id, name, description FROM boards ORDER BY name")
                .fetch_all(self.pool)
                .await
                .map_err(|e| ForumError::Database(e.to_string()))?;

        Ok(boards)
    }

    /// List all boards with topic/post counts and their latest post, ordered by name.
    pub async fn list_summaries(&self) -> Result<Vec<BoardSummary>> {
        let boards = sqlx::query_as::<_, BoardSummary>(
            "SELECT b.id, b.name, b.description,
                    (SELECT COUNT(*) FROM topics t WHERE t.board_id = b.id) AS topic_count,
                    (SELECT COUNT(*) FROM posts p JOIN topics t ON t.id = p.topic_id
                      WHERE t.board_id = b.id) AS post_count,
                    (SELECT p.created_at FROM posts p JOIN topics t ON t.id = p.topic_id
                      WHERE t.board_id = b.id
                      ORDER BY p.created_at DESC, p.id DESC LIMIT 1) AS last_post_at,
                    (SELECT u.username FROM posts p
                       JOIN topics t ON t.id = p.topic_id
                       JOIN users u ON u.id = p.created_by
                      WHERE t.board_id = b.id
                      ORDER BY p.created_at DESC, p.id DESC LIMIT 1) AS last_post_by
             FROM boards b
             ORDER BY b.name",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| ForumError::Database(e.to_string()))?;

        Ok(boards)
    }

    /// Create the board unless one with the same name exists.
    ///
    /// Returns the board and whether it was created.
    pub async fn ensure(&self, new_board: &NewBoard) -> Result<(Board, bool)> {
        if let Some(board) = self.get_by_name(&new_board.name).await? {
            return Ok((board, false));
        }
        Ok((self.create(new_board).await?, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardService, NewTopic};
    use crate::db::{NewUser, UserRepository};
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_board() {
        let db = setup_db().await;
        let repo = BoardRepository::new(db.pool());

        let board = repo
            .create(&NewBoard::new("Django").with_description("Django board."))
            .await
            .unwrap();

        assert_eq!(board.id, 1);
        assert_eq!(board.name, "Django");
        assert_eq!(board.description, "Django board.");
        assert!(repo.create(&NewBoard::new("Django")).await.is_err());
    }

    #[tokio::test]
    async fn test_get_and_list() {
        let db = setup_db().await;
        let repo = BoardRepository::new(db.pool());
        repo.create(&NewBoard::new("Python")).await.unwrap();
        let django = repo.create(&NewBoard::new("Django")).await.unwrap();

        assert_eq!(repo.get_by_id(django.id).await.unwrap(), Some(django.clone()));
        assert!(repo.get_by_id(99).await.unwrap().is_none());
        assert_eq!(repo.get_by_name("Django").await.unwrap(), Some(django));

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(names, ["Django", "Python"]);
    }

    #[tokio::test]
    async fn test_ensure() {
        let db = setup_db().await;
        let repo = BoardRepository::new(db.pool());

        let (first, created) = repo.ensure(&NewBoard::new("Django")).await.unwrap();
        assert!(created);
        let (second, created) = repo
            .ensure(&NewBoard::new("Django").with_description("other"))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_list_summaries() {
        let db = setup_db().await;
        let repo = BoardRepository::new(db.pool());
        let django = repo.create(&NewBoard::new("Django")).await.unwrap();
        repo.create(&NewBoard::new("Python")).await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("john", "pw"))
            .await
            .unwrap();

        let service = BoardService::new(&db);
        let topic = service
            .create_topic(&NewTopic::new(django.id, "Hello", "First", user.id))
            .await
            .unwrap();
        service.reply(&django, &topic, "Second", user.id, 10).await.unwrap();

        let summaries = repo.list_summaries().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "Django");
        assert_eq!(summaries[0].topic_count, 1);
        assert_eq!(summaries[0].post_count, 2);
        assert_eq!(summaries[0].last_post_by.as_deref(), Some("john"));
        assert_eq!(summaries[1].topic_count, 0);
        assert!(summaries[1].last_post_at.is_none());
    }
}
