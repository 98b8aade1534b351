//! File entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cloudvault_core::types::{DirectoryId, FileId, UserId};

/// Metadata for a stored file. The bytes live in the blob store under
/// `stored_blob_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FileEntry {
    /// Unique file identifier.
    pub id: FileId,
    /// User-visible file name.
    #[sqlx(rename = "filename")]
    pub display_name: String,
    /// Opaque blob name, unrelated to `display_name`.
    #[sqlx(rename = "stored_name")]
    #[serde(skip_serializing)]
    pub stored_blob_id: String,
    /// MIME type recorded at upload.
    pub mime_type: String,
    /// Size in bytes recorded at upload.
    #[sqlx(rename = "size")]
    pub byte_size: i64,
    /// The directory containing this file.
    pub directory_id: DirectoryId,
    /// The uploader. Never changes, even inside someone else's directory.
    pub owner_id: UserId,
    /// When the file was uploaded.
    pub created_at: DateTime<Utc>,
}

impl FileEntry {
    /// Check whether the given user owns this file.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.display_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
            .map(|ext| ext.to_lowercase())
    }
}

/// Data required to record a new file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFileEntry {
    /// User-visible file name.
    pub display_name: String,
    /// Opaque blob name.
    pub stored_blob_id: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub byte_size: i64,
    /// Containing directory.
    pub directory_id: DirectoryId,
    /// Uploader.
    pub owner_id: UserId,
}
