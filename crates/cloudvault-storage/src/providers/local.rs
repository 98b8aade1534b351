//! Local filesystem blob store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use cloudvault_core::config::StorageConfig;
use cloudvault_core::error::{AppError, ErrorKind};
use cloudvault_core::result::AppResult;
use cloudvault_core::traits::BlobStore;

/// Longest accepted blob id.
const MAX_BLOB_ID_LEN: usize = 128;

/// Blob store keeping one file per blob under a root directory.
///
/// With sharding enabled a blob `abcdef…` lives at `<root>/ab/abcdef…`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Root directory for all stored blobs.
    root: PathBuf,
    /// Whether blobs are spread over two-character prefix directories.
    shard: bool,
}

impl LocalBlobStore {
    /// Create a blob store from configuration, creating the root if needed.
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        Self::open(&config.root_path, config.shard_blobs).await
    }

    /// Create a blob store rooted at `root`.
    pub async fn open(root: impl AsRef<Path>, shard: bool) -> AppResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root, shard })
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a blob id to its path, rejecting anything that could escape
    /// the root.
    fn resolve(&self, id: &str) -> AppResult<PathBuf> {
        validate_blob_id(id)?;
        if self.shard && id.len() > 2 {
            Ok(self.root.join(&id[..2]).join(id))
        } else {
            Ok(self.root.join(id))
        }
    }

    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

fn validate_blob_id(id: &str) -> AppResult<()> {
    let valid = !id.is_empty()
        && id.len() <= MAX_BLOB_ID_LEN
        && !id.starts_with('.')
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
    if valid {
        Ok(())
    } else {
        Err(AppError::validation(format!("Invalid blob id: {id:?}")))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false))
    }

    async fn exists(&self, id: &str) -> AppResult<bool> {
        let path = self.resolve(id)?;
        fs::try_exists(&path).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to stat blob: {id}"), e)
        })
    }

    async fn write(&self, id: &str, data: Bytes) -> AppResult<()> {
        let path = self.resolve(id)?;
        self.ensure_parent(&path).await?;

        // Write beside the target and rename so readers never see a torn blob.
        let partial = path.with_file_name(format!(".{id}.part"));
        fs::write(&partial, &data).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to write blob: {id}"), e)
        })?;
        fs::rename(&partial, &path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to finalize blob: {id}"),
                e,
            )
        })?;

        debug!(blob_id = id, bytes = data.len(), "Wrote blob");
        Ok(())
    }

    async fn read(&self, id: &str) -> AppResult<Bytes> {
        let path = self.resolve(id)?;
        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Blob not found: {id}"))
            } else {
                AppError::with_source(ErrorKind::Storage, format!("Failed to read blob: {id}"), e)
            }
        })?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let path = self.resolve(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(blob_id = id, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete blob: {id}"),
                e,
            )),
        }
    }

    async fn size(&self, id: &str) -> AppResult<Option<u64>> {
        let path = self.resolve(id)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to stat blob: {id}"),
                e,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::open(dir.path(), true).await.unwrap();

        let data = Bytes::from("hello world");
        store.write("abc123", data.clone()).await.unwrap();

        assert!(store.exists("abc123").await.unwrap());
        assert!(dir.path().join("ab").join("abc123").is_file());
        assert_eq!(store.size("abc123").await.unwrap(), Some(11));
        assert_eq!(store.read("abc123").await.unwrap(), data);

        store.delete("abc123").await.unwrap();
        assert!(!store.exists("abc123").await.unwrap());
        assert_eq!(store.size("abc123").await.unwrap(), None);

        // Deleting again is fine.
        store.delete("abc123").await.unwrap();
    }

    #[tokio::test]
    async fn test_unsharded_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::open(dir.path(), false).await.unwrap();

        store.write("flat-blob", Bytes::from("x")).await.unwrap();
        assert!(dir.path().join("flat-blob").is_file());
        assert!(store.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_blob_read_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::open(dir.path(), true).await.unwrap();

        let err = store.read("nothing-here").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_rejects_escaping_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::open(dir.path(), true).await.unwrap();

        for id in ["", "../etc/passwd", "a/b", ".hidden", "back\\slash"] {
            let err = store.write(id, Bytes::from("x")).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "{id:?}");
        }
    }
}
