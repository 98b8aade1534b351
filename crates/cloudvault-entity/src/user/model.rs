//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cloudvault_core::types::UserId;

/// A user known to the storage service. Credentials are held by the
/// authentication gateway, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Email address, unique case-insensitively.
    pub email: String,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// Whether the user has administrator rights.
    pub is_admin: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name to show in listings, falling back to the email.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address.
    pub email: String,
    /// Display name.
    pub display_name: Option<String>,
    /// Administrator flag.
    pub is_admin: bool,
}
