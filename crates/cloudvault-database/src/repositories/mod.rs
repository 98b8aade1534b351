//! Concrete repository implementations.
//!
//! Each repository wraps a [`sqlx::SqlitePool`]. Operations that must be
//! atomic across several statements open one transaction and run every
//! statement on it; nothing touches the pool while that transaction is open.

pub mod directory;
pub mod file;
pub mod share;
pub mod user;
mod walk;

pub use directory::{DirectoryRepository, SubtreeRemoval};
pub use file::FileRepository;
pub use share::ShareRepository;
pub use user::UserRepository;

use cloudvault_core::error::{AppError, ErrorKind};

/// Whether a sqlx error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Map a sqlx error into a database [`AppError`] with context.
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}

#[cfg(test)]
pub(crate) mod testing {
    use sqlx::SqlitePool;

    use cloudvault_core::types::UserId;

    use crate::connection::DatabasePool;

    /// A migrated in-memory pool.
    pub async fn pool() -> SqlitePool {
        DatabasePool::in_memory().await.unwrap().into_pool()
    }

    /// Insert a user row and return its id.
    pub async fn user(pool: &SqlitePool, email: &str) -> UserId {
        let id = UserId::new();
        sqlx::query("INSERT INTO users (id, email, is_admin, created_at) VALUES (?, ?, 0, ?)")
            .bind(id)
            .bind(email)
            .bind(chrono::Utc::now())
            .execute(pool)
            .await
            .unwrap();
        id
    }
}
