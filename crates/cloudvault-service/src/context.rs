//! Request context carrying the identity supplied by the authentication
//! gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cloudvault_core::types::UserId;

/// Context for the current authenticated request.
///
/// Built at the HTTP boundary (or by the CLI) and passed into every service
/// method, so no operation ever looks the caller up ambiently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: UserId,
    /// Whether the gateway marked the caller as an administrator.
    pub is_admin: bool,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context for a regular user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
            request_time: Utc::now(),
        }
    }

    /// Creates a context for an administrator.
    pub fn admin(user_id: UserId) -> Self {
        Self {
            is_admin: true,
            ..Self::new(user_id)
        }
    }

    /// Returns whether the current user is an admin.
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}
