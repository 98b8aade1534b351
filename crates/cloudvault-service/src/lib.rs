//! # cloudvault-service
//!
//! Business logic service layer for CloudVault. Each service orchestrates
//! repositories and the blob store to implement one group of use cases,
//! with authorization decided by the [`AccessResolver`].
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod access;
pub mod context;
pub mod directory;
pub mod file;
pub mod services;
pub mod share;
pub mod user;
pub mod validation;

#[cfg(test)]
mod testing;

pub use access::AccessResolver;
pub use context::RequestContext;
pub use directory::{ArchiveExporter, DirectoryService, TreeService};
pub use file::{FileEnricher, FileService, UploadService};
pub use services::Services;
pub use share::ShareService;
pub use user::UserService;
