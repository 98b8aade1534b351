//! Core traits defined in `cloudvault-core` and implemented by other crates.

pub mod blob;

pub use blob::BlobStore;
