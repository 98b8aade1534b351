//! Share grant entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use cloudvault_core::types::{ItemRef, ItemType, ShareGrantId, UserId};

/// An edge recording that an item is visible to a user other than its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShareGrant {
    /// Unique grant identifier.
    pub id: ShareGrantId,
    /// Kind of the shared item.
    pub item_type: ItemType,
    /// Id of the shared item, interpreted through `item_type`.
    pub item_id: Uuid,
    /// Who granted access.
    #[sqlx(rename = "shared_by_user_id")]
    pub owner_id: UserId,
    /// Who received access.
    #[sqlx(rename = "shared_with_user_id")]
    pub grantee_id: UserId,
    /// When the grant was made.
    pub created_at: DateTime<Utc>,
}

impl ShareGrant {
    /// The shared item as a typed reference.
    pub fn item(&self) -> ItemRef {
        ItemRef::from_parts(self.item_type, self.item_id)
    }
}
