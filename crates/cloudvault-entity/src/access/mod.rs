//! Access classification for items.

pub mod visibility;

pub use visibility::Visibility;
