//! Core type definitions used across the CloudVault workspace.

pub mod id;
pub mod reference;

pub use id::*;
pub use reference::{DirectoryRef, ItemRef, ItemType};
