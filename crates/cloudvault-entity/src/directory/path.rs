//! Breadcrumb path segments.

use serde::{Deserialize, Serialize};

use cloudvault_core::types::DirectoryRef;

/// One hop of a breadcrumb trail, from the home segment down to the
/// directory being viewed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    /// Where this segment navigates to.
    pub target: DirectoryRef,
    /// Label shown for the segment.
    pub name: String,
    /// Whether the viewer reaches this directory through a share.
    pub is_shared: bool,
}

impl PathSegment {
    /// The synthetic segment pointing at the viewer's own root.
    pub fn home(label: impl Into<String>) -> Self {
        Self {
            target: DirectoryRef::Root,
            name: label.into(),
            is_shared: false,
        }
    }
}
