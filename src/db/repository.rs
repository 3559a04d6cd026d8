//! User repository for the forum.
//!
//! This module provides CRUD operations for users in the database.

use sqlx::QueryBuilder;

use super::user::{NewUser, User, UserUpdate};
use super::DbPool;
use crate::{ForumError, Result};

const USER_COLUMNS: &str =
    "id, username, email, password, first_name, last_name, is_active, created_at, last_login";

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// Returns the created user with the assigned ID.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, password, email, first_name, last_name)
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&new_user.username)
        .bind(&new_user.password)
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| ForumError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| ForumError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| ForumError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get a user by username (case-insensitive).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ? COLLATE NOCASE");
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| ForumError::Database(e.to_string()))?;

        Ok(result)
    }

    /// List active users registered with an email address (case-insensitive).
    ///
    /// More than one account may share an address.
    pub async fn list_active_by_email(&self, email: &str) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE email = ? COLLATE NOCASE AND email != '' AND is_active = 1
             ORDER BY id"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_all(self.pool)
            .await
            .map_err(|e| ForumError::Database(e.to_string()))?;

        Ok(users)
    }

    /// Update a user by ID.
    ///
    /// Only fields that are set in the update will be modified.
    /// Returns the updated user, or None if not found.
    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = query.separated(", ");

        if let Some(ref password) = update.password {
            separated.push("password = ");
            separated.push_bind_unseparated(password.clone());
        }
        if let Some(ref email) = update.email {
            separated.push("email = ");
            separated.push_bind_unseparated(email.clone());
        }
        if let Some(ref first_name) = update.first_name {
            separated.push("first_name = ");
            separated.push_bind_unseparated(first_name.clone());
        }
        if let Some(ref last_name) = update.last_name {
            separated.push("last_name = ");
            separated.push_bind_unseparated(last_name.clone());
        }
        if let Some(is_active) = update.is_active {
            separated.push("is_active = ");
            separated.push_bind_unseparated(is_active);
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| ForumError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Replace a user's password hash.
    pub async fn set_password(&self, id: i64, password_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET password = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| ForumError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(ForumError::NotFound("user".to_string()));
        }
        Ok(())
    }

    /// Update the last login timestamp for a user.
    pub async fn update_last_login(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = datetime('now') WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| ForumError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await
            .map_err(|e| ForumError::Database(e.to_string()))?;
        Ok(count.0)
    }

    /// Check if a username is already taken (case-insensitive).
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = ? COLLATE NOCASE)")
                .bind(username)
                .fetch_one(self.pool)
                .await
                .map_err(|e| ForumError::Database(e.to_string()))?;
        Ok(exists.0)
    }
}
