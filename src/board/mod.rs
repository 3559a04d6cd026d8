//! Board module.
//!
//! This module provides the forum's content model:
//! - Boards, the named categories shown on the home page
//! - Topics, discussion threads opened inside a board
//! - Posts, the messages of a topic
//! - Pagination of topic and post listings

mod pagination;
mod post;
mod post_repository;
mod repository;
mod service;
mod topic;
mod topic_repository;
mod types;

pub use pagination::{ItemLocation, PageInfo};
pub use post::{NewPost, Post, PostView, MAX_MESSAGE_LENGTH};
pub use post_repository::PostRepository;
pub use repository::BoardRepository;
pub use service::BoardService;
pub use topic::{NewTopic, Topic, TopicSummary, MAX_SUBJECT_LENGTH};
pub use topic_repository::TopicRepository;
pub use types::{
    Board, BoardSummary, NewBoard, MAX_BOARD_DESCRIPTION_LENGTH, MAX_BOARD_NAME_LENGTH,
};
