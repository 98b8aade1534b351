//! Blob storage configuration.

use serde::{Deserialize, Serialize};

/// Default upload ceiling: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Blob storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding one opaque-named file per stored blob.
    #[serde(default = "default_root_path")]
    pub root_path: String,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Spread blobs over two-character prefix directories.
    #[serde(default = "default_shard_blobs")]
    pub shard_blobs: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            max_upload_size_bytes: default_max_upload(),
            shard_blobs: default_shard_blobs(),
        }
    }
}

fn default_root_path() -> String {
    "data/blobs".to_string()
}

fn default_max_upload() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_shard_blobs() -> bool {
    true
}
