//! Blob store trait for the byte-storage collaborator.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Trait for blob storage backends.
///
/// Blobs are addressed by an opaque stored name that is never derived from
/// a user-visible filename. The [`BlobStore`] trait is defined here in
/// `cloudvault-core` and implemented in `cloudvault-storage`.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local").
    fn provider_type(&self) -> &str;

    /// Check whether the backend is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Check whether a blob exists.
    async fn exists(&self, id: &str) -> AppResult<bool>;

    /// Write (or replace) a blob.
    async fn write(&self, id: &str, data: Bytes) -> AppResult<()>;

    /// Read a blob into memory.
    async fn read(&self, id: &str) -> AppResult<Bytes>;

    /// Delete a blob. Deleting a missing blob is not an error.
    async fn delete(&self, id: &str) -> AppResult<()>;

    /// Size of a blob in bytes, or `None` when it does not exist.
    async fn size(&self, id: &str) -> AppResult<Option<u64>>;
}
