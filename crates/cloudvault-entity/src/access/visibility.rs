//! How an item appears to a given viewer.

use serde::{Deserialize, Serialize};

/// Visibility of an item to one user. Computed per access, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// The viewer owns the item.
    Owned,
    /// The item is shared with the viewer directly.
    SharedDirect,
    /// The viewer cannot see the item.
    NoAccess,
}

impl Visibility {
    /// Whether the viewer may list or download the item.
    pub fn can_read(&self) -> bool {
        !matches!(self, Self::NoAccess)
    }

    /// Whether the viewer may rename, move, delete or share the item.
    pub fn can_mutate(&self) -> bool {
        matches!(self, Self::Owned)
    }

    /// Whether the viewer reaches the item through a share.
    pub fn is_shared(&self) -> bool {
        matches!(self, Self::SharedDirect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rights() {
        assert!(Visibility::Owned.can_mutate());
        assert!(Visibility::SharedDirect.can_read());
        assert!(Visibility::SharedDirect.is_shared());
        assert!(!Visibility::SharedDirect.can_mutate());
        assert!(!Visibility::NoAccess.can_read());
        assert!(!Visibility::Owned.is_shared());
    }
}
