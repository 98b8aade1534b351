//! User repository implementation.

use chrono::Utc;
use sqlx::SqlitePool;

use cloudvault_core::error::{AppError, ConflictReason, ErrorKind};
use cloudvault_core::result::AppResult;
use cloudvault_core::types::UserId;
use cloudvault_entity::user::{CreateUser, User};

use super::{db_error, is_unique_violation};

/// Repository for user records.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find user"))
    }

    /// Find a user by email, ignoring case.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER(?)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find user by email"))
    }

    /// Create a new user.
    pub async fn create(&self, data: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, display_name, is_admin, created_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(UserId::new())
        .bind(data.email.trim())
        .bind(&data.display_name)
        .bind(data.is_admin)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(
                    ConflictReason::EmailTaken,
                    format!("A user with email '{}' already exists", data.email.trim()),
                )
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create user", e)
            }
        })
    }

    /// List all users ordered by email.
    pub async fn list_all(&self) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY LOWER(email) ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list users"))
    }
}
