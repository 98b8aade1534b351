//! User provisioning: the storage service only keeps the identity data it
//! needs to resolve share targets.

use std::sync::Arc;

use tracing::info;

use cloudvault_core::error::AppError;
use cloudvault_core::result::AppResult;
use cloudvault_core::types::UserId;
use cloudvault_database::repositories::UserRepository;
use cloudvault_entity::user::{CreateUser, User};

use crate::validation::validate_email;

/// Creates and lists users.
#[derive(Debug, Clone)]
pub struct UserService {
    /// User repository.
    user_repo: Arc<UserRepository>,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(user_repo: Arc<UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Registers a user. Emails are unique regardless of case.
    pub async fn create_user(
        &self,
        email: &str,
        display_name: Option<String>,
        is_admin: bool,
    ) -> AppResult<User> {
        let email = validate_email(email)?;
        let display_name = display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        let user = self
            .user_repo
            .create(&CreateUser {
                email,
                display_name,
                is_admin,
            })
            .await?;

        info!(user_id = %user.id, is_admin, "User created");
        Ok(user)
    }

    /// Gets a user by ID.
    pub async fn get_user(&self, id: UserId) -> AppResult<User> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Gets a user by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<User> {
        self.user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No user with email {}", email.trim())))
    }

    /// Lists every user.
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.user_repo.list_all().await
    }
}
