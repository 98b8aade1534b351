//! # cloudvault-storage
//!
//! Blob storage backends for CloudVault plus the naming helpers shared by
//! uploads and archive export: opaque blob ids, MIME guessing, and archive
//! entry-name sanitizing.

pub mod naming;
pub mod providers;

pub use naming::{mime_from_path, new_blob_id, sanitize_entry_name, unique_entry_name};
pub use providers::LocalBlobStore;
