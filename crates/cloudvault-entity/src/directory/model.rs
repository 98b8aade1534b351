//! Directory entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cloudvault_core::types::{DirectoryId, DirectoryRef, ItemRef, UserId};

/// Longest accepted directory or file name, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// A directory in a user's tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Directory {
    /// Unique directory identifier.
    pub id: DirectoryId,
    /// Display name, unique among the owner's siblings.
    pub name: String,
    /// Parent directory (null for the owner's root).
    pub parent_id: Option<DirectoryId>,
    /// The directory owner. Never changes.
    pub owner_id: UserId,
    /// When the directory was created.
    pub created_at: DateTime<Utc>,
}

impl Directory {
    /// Check if this is a root directory (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check whether the given user owns this directory.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    /// A reference to this directory for navigation links.
    pub fn to_ref(&self) -> DirectoryRef {
        DirectoryRef::Id(self.id)
    }

    /// This directory as a shareable item.
    pub fn item_ref(&self) -> ItemRef {
        ItemRef::Directory(self.id)
    }
}

/// Data required to create a new directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDirectory {
    /// Directory name.
    pub name: String,
    /// Parent directory (None for a root).
    pub parent_id: Option<DirectoryId>,
    /// The directory owner.
    pub owner_id: UserId,
}
