//! Directory services: the facade, ZIP export and tree inspection.

pub mod archive;
pub mod service;
pub mod tree;

pub use archive::{ArchiveExporter, ArchiveStats};
pub use service::{
    Archive, DeleteSummary, DirectoryListing, DirectoryService, DirectoryView, ShareOutcome,
    SharedWithMe,
};
pub use tree::{TreeEntry, TreeService};
