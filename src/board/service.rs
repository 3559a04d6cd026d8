//! Board service.
//!
//! High-level operations for boards, topics and posts: listing with
//! pagination, atomic topic creation and replies.

use tracing::{debug, info};

use crate::config::BoardSeed;
use crate::db::Database;
use crate::{ForumError, Result};

use super::pagination::{ItemLocation, PageInfo};
use super::post::{NewPost, Post, PostView, MAX_MESSAGE_LENGTH};
use super::post_repository::PostRepository;
use super::repository::BoardRepository;
use super::topic::{NewTopic, Topic, TopicSummary, MAX_SUBJECT_LENGTH};
use super::topic_repository::TopicRepository;
use super::types::{
    Board, BoardSummary, NewBoard, MAX_BOARD_DESCRIPTION_LENGTH, MAX_BOARD_NAME_LENGTH,
};

fn validate_text(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ForumError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(ForumError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Service for board operations.
pub struct BoardService<'a> {
    db: &'a Database,
}

impl<'a> BoardService<'a> {
    /// Create a new BoardService with the given database reference.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// List all boards with their statistics.
    pub async fn list_boards(&self) -> Result<Vec<BoardSummary>> {
        BoardRepository::new(self.db.pool()).list_summaries().await
    }

    /// Get a board by ID.
    pub async fn get_board(&self, board_id: i64) -> Result<Board> {
        BoardRepository::new(self.db.pool())
            .get_by_id(board_id)
            .await?
            .ok_or_else(|| ForumError::NotFound("board".to_string()))
    }

    /// Create the configured boards that do not exist yet.
    ///
    /// Returns the number of boards created.
    pub async fn seed_boards(&self, seeds: &[BoardSeed]) -> Result<usize> {
        let repo = BoardRepository::new(self.db.pool());
        let mut created = 0;

        for seed in seeds {
            let name = seed.name.trim();
            validate_text("board name", name, MAX_BOARD_NAME_LENGTH)?;
            if seed.description.chars().count() > MAX_BOARD_DESCRIPTION_LENGTH {
                return Err(ForumError::Validation(format!(
                    "board description must be at most {MAX_BOARD_DESCRIPTION_LENGTH} characters"
                )));
            }

            let new_board = NewBoard::new(name).with_description(seed.description.trim());
            let (board, was_created) = repo.ensure(&new_board).await?;
            if was_created {
                info!(board_id = board.id, name = %board.name, "Board created");
                created += 1;
            }
        }

        Ok(created)
    }

    /// Get a topic that belongs to `board_id`.
    pub async fn get_topic(&self, board_id: i64, topic_id: i64) -> Result<Topic> {
        TopicRepository::new(self.db.pool())
            .get_in_board(board_id, topic_id)
            .await?
            .ok_or_else(|| ForumError::NotFound("topic".to_string()))
    }

    /// List one page of a board's topics, most recently updated first.
    pub async fn list_topics(
        &self,
        board_id: i64,
        page: Option<&str>,
        per_page: i64,
    ) -> Result<(Vec<TopicSummary>, PageInfo)> {
        let repo = TopicRepository::new(self.db.pool());
        let total = repo.count_by_board(board_id).await?;
        let page = PageInfo::resolve(page, total, per_page);
        let topics = repo
            .list_by_board_paginated(board_id, page.offset(), page.per_page)
            .await?;
        Ok((topics, page))
    }

    /// Create a topic and its opening post in one transaction.
    pub async fn create_topic(&self, new_topic: &NewTopic) -> Result<Topic> {
        validate_text("subject", &new_topic.subject, MAX_SUBJECT_LENGTH)?;
        validate_text("message", &new_topic.message, MAX_MESSAGE_LENGTH)?;

        let mut tx = self.db.begin().await?;

        let topic_id = TopicRepository::insert(&mut tx, new_topic).await?;
        let opening = NewPost::new(topic_id, new_topic.message.as_str(), new_topic.starter_id);
        PostRepository::insert(&mut tx, &opening).await?;

        tx.commit()
            .await
            .map_err(|e| ForumError::Database(e.to_string()))?;

        info!(
            topic_id,
            board_id = new_topic.board_id,
            starter_id = new_topic.starter_id,
            "Topic created"
        );

        TopicRepository::new(self.db.pool())
            .get_by_id(topic_id)
            .await?
            .ok_or_else(|| ForumError::NotFound("topic".to_string()))
    }

    /// List one page of a topic's posts and count the visit.
    ///
    /// The view counter update is a separate statement from the read.
    pub async fn view_topic(
        &self,
        topic: &Topic,
        page: Option<&str>,
        per_page: i64,
    ) -> Result<(Vec<PostView>, PageInfo)> {
        TopicRepository::new(self.db.pool())
            .increment_views(topic.id)
            .await?;

        let repo = PostRepository::new(self.db.pool());
        let total = repo.count_by_topic(topic.id).await?;
        let page = PageInfo::resolve(page, total, per_page);
        let posts = repo
            .list_by_topic_paginated(topic.id, page.offset(), page.per_page)
            .await?;

        debug!(topic_id = topic.id, page = page.number, "Topic viewed");
        Ok((posts, page))
    }

    /// Most recent posts of a topic, newest first.
    pub async fn recent_posts(&self, topic_id: i64, limit: i64) -> Result<Vec<PostView>> {
        PostRepository::new(self.db.pool())
            .list_recent_by_topic(topic_id, limit)
            .await
    }

    /// Add a reply to a topic and bump its `last_updated`.
    ///
    /// Returns the new post and where it sits in the topic's post list
    /// with `per_page` posts per page.
    pub async fn reply(
        &self,
        board: &Board,
        topic: &Topic,
        message: &str,
        author_id: i64,
        per_page: i64,
    ) -> Result<(Post, ItemLocation)> {
        validate_text("message", message, MAX_MESSAGE_LENGTH)?;
        if topic.board_id != board.id {
            return Err(ForumError::NotFound("topic".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let existing = PostRepository::count_in_topic(&mut tx, topic.id).await?;
        let post_id =
            PostRepository::insert(&mut tx, &NewPost::new(topic.id, message, author_id)).await?;
        TopicRepository::touch(&mut tx, topic.id).await?;

        tx.commit()
            .await
            .map_err(|e| ForumError::Database(e.to_string()))?;

        let location = ItemLocation::appended(existing, per_page);
        info!(
            topic_id = topic.id,
            post_id,
            position = location.position,
            "Reply posted"
        );

        let post = PostRepository::new(self.db.pool())
            .get_by_id(post_id)
            .await?
            .ok_or_else(|| ForumError::NotFound("post".to_string()))?;
        Ok((post, location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::NewBoard;
    use crate::db::{NewUser, UserRepository};

    async fn setup() -> (Database, Board, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let board = BoardRepository::new(db.pool())
            .create(&NewBoard::new("Django"))
            .await
            .unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("john", "pw"))
            .await
            .unwrap();
        (db, board, user.id)
    }

    async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_seed_boards_is_idempotent() {
        let (db, _, _) = setup().await;
        let seeds = vec![
            BoardSeed {
                name: "Django".to_string(),
                description: "Existing".to_string(),
            },
            BoardSeed {
                name: "Python".to_string(),
                description: "General discussion about Python.".to_string(),
            },
        ];
        let service = BoardService::new(&db);

        assert_eq!(service.seed_boards(&seeds).await.unwrap(), 1);
        assert_eq!(service.seed_boards(&seeds).await.unwrap(), 0);
        assert_eq!(count(&db, "boards").await, 2);
    }

    #[tokio::test]
    async fn test_seed_boards_rejects_long_name() {
        let (db, _, _) = setup().await;
        let seeds = vec![BoardSeed {
            name: "x".repeat(MAX_BOARD_NAME_LENGTH + 1),
            description: String::new(),
        }];

        let result = BoardService::new(&db).seed_boards(&seeds).await;
        assert!(matches!(result, Err(ForumError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_board_not_found() {
        let (db, _, _) = setup().await;
        let result = BoardService::new(&db).get_board(99).await;
        assert!(matches!(result, Err(ForumError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_topic_creates_one_topic_and_one_post() {
        let (db, board, user_id) = setup().await;
        let service = BoardService::new(&db);

        let topic = service
            .create_topic(&NewTopic::new(board.id, "Test title", "Lorem ipsum", user_id))
            .await
            .unwrap();

        assert_eq!(topic.subject, "Test title");
        assert_eq!(topic.starter_id, user_id);
        assert_eq!(topic.views, 0);
        assert_eq!(count(&db, "topics").await, 1);
        assert_eq!(count(&db, "posts").await, 1);
    }

    #[tokio::test]
    async fn test_create_topic_rolls_back_when_post_fails() {
        let (db, board, user_id) = setup().await;
        sqlx::query(
            "CREATE TRIGGER reject_posts BEFORE INSERT ON posts
             BEGIN SELECT RAISE(ABORT, 'posts are read-only'); END",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let result = BoardService::new(&db)
            .create_topic(&NewTopic::new(board.id, "Subject", "Body", user_id))
            .await;

        assert!(matches!(result, Err(ForumError::Database(_))));
        assert_eq!(count(&db, "topics").await, 0);
        assert_eq!(count(&db, "posts").await, 0);
    }

    #[tokio::test]
    async fn test_create_topic_rejects_unknown_references() {
        let (db, board, _) = setup().await;
        let service = BoardService::new(&db);

        // Unknown starter: the topic insert fails on the foreign key.
        let result = service
            .create_topic(&NewTopic::new(board.id, "Subject", "Body", 999))
            .await;
        assert!(result.is_err());

        // Unknown board.
        let result = service
            .create_topic(&NewTopic::new(999, "Subject", "Body", 1))
            .await;
        assert!(result.is_err());

        assert_eq!(count(&db, "topics").await, 0);
        assert_eq!(count(&db, "posts").await, 0);
    }

    #[tokio::test]
    async fn test_create_topic_validation() {
        let (db, board, user_id) = setup().await;
        let service = BoardService::new(&db);

        let result = service
            .create_topic(&NewTopic::new(board.id, "  ", "Body", user_id))
            .await;
        assert!(matches!(result, Err(ForumError::Validation(_))));

        let long = "x".repeat(MAX_MESSAGE_LENGTH + 1);
        let result = service
            .create_topic(&NewTopic::new(board.id, "Subject", long, user_id))
            .await;
        assert!(matches!(result, Err(ForumError::Validation(_))));
        assert_eq!(count(&db, "topics").await, 0);
    }

    #[tokio::test]
    async fn test_view_topic_increments_views_and_paginates() {
        let (db, board, user_id) = setup().await;
        let service = BoardService::new(&db);
        let topic = service
            .create_topic(&NewTopic::new(board.id, "Subject", "1", user_id))
            .await
            .unwrap();
        for i in 2..=5 {
            service
                .reply(&board, &topic, &i.to_string(), user_id, 2)
                .await
                .unwrap();
        }

        let (posts, page) = service.view_topic(&topic, Some("3"), 2).await.unwrap();
        assert_eq!(page.num_pages, 3);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].message, "5");

        service.view_topic(&topic, None, 2).await.unwrap();
        let topic = service.get_topic(board.id, topic.id).await.unwrap();
        assert_eq!(topic.views, 2);
    }

    #[tokio::test]
    async fn test_reply_location() {
        let (db, board, user_id) = setup().await;
        let service = BoardService::new(&db);
        let topic = service
            .create_topic(&NewTopic::new(board.id, "Subject", "opening", user_id))
            .await
            .unwrap();

        let (post, loc) = service
            .reply(&board, &topic, "second", user_id, 2)
            .await
            .unwrap();
        assert_eq!(post.message, "second");
        assert_eq!(loc, ItemLocation { page: 1, position: 2 });

        let (_, loc) = service
            .reply(&board, &topic, "third", user_id, 2)
            .await
            .unwrap();
        assert_eq!(loc, ItemLocation { page: 2, position: 3 });
    }

    #[tokio::test]
    async fn test_reply_rejects_topic_from_other_board() {
        let (db, board, user_id) = setup().await;
        let other = BoardRepository::new(db.pool())
            .create(&NewBoard::new("Python"))
            .await
            .unwrap();
        let service = BoardService::new(&db);
        let topic = service
            .create_topic(&NewTopic::new(board.id, "Subject", "opening", user_id))
            .await
            .unwrap();

        let result = service.reply(&other, &topic, "hi", user_id, 10).await;
        assert!(matches!(result, Err(ForumError::NotFound(_))));
        assert_eq!(count(&db, "posts").await, 1);
    }

    #[tokio::test]
    async fn test_list_topics_and_recent_posts() {
        let (db, board, user_id) = setup().await;
        let service = BoardService::new(&db);
        for i in 0..3 {
            service
                .create_topic(&NewTopic::new(board.id, format!("T{i}"), "m", user_id))
                .await
                .unwrap();
        }

        let (topics, page) = service.list_topics(board.id, Some("2"), 2).await.unwrap();
        assert_eq!(page.number, 2);
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].subject, "T0");

        let recent = service.recent_posts(topics[0].id, 10).await.unwrap();
        assert_eq!(recent.len(), 1);
    }
}
