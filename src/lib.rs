//! Forum - a discussion board web application
//!
//! Boards hold topics, topics hold posts. Visitors browse freely; registered
//! users start topics and reply. Accounts support signup, login, password
//! change and password reset by mail.

pub mod auth;
pub mod board;
pub mod config;
pub mod db;
pub mod error;
pub mod i18n;
pub mod logging;
pub mod mail;
pub mod template;
pub mod web;

pub use auth::{
    hash_password, register, validate_password, verify_password, AuthSession, PasswordError,
    RegistrationError, RegistrationRequest, SessionError, SessionManager, ValidationError,
};
pub use board::{Board, BoardService, PageInfo, Post, Topic};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository, UserUpdate};
pub use error::{ForumError, Result};
pub use web::{AppState, WebServer};
