//! Directory tree and preview policy configuration.

use serde::{Deserialize, Serialize};

/// Limits and labels for directory tree walks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Safety bound on ancestor and subtree walks, in hops.
    #[serde(default = "default_max_walk_depth")]
    pub max_walk_depth: usize,
    /// Name given to a lazily created root directory.
    #[serde(default = "default_root_name")]
    pub root_name: String,
    /// Label of the synthetic first breadcrumb segment.
    #[serde(default = "default_home_label")]
    pub home_label: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_walk_depth: default_max_walk_depth(),
            root_name: default_root_name(),
            home_label: default_home_label(),
        }
    }
}

/// Which MIME types may be previewed inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Also preview `audio/*` and `video/*` in addition to images and PDFs.
    #[serde(default = "default_include_media")]
    pub include_media: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            include_media: default_include_media(),
        }
    }
}

impl PreviewConfig {
    /// Whether a file with this MIME type can be previewed.
    pub fn is_previewable(&self, mime_type: &str) -> bool {
        let mime = mime_type.trim().to_ascii_lowercase();
        if mime.starts_with("image/") || mime == "application/pdf" {
            return true;
        }
        self.include_media && (mime.starts_with("audio/") || mime.starts_with("video/"))
    }
}

fn default_max_walk_depth() -> usize {
    128
}

fn default_root_name() -> String {
    "Root".to_string()
}

fn default_home_label() -> String {
    "My Files".to_string()
}

fn default_include_media() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_policy() {
        let policy = PreviewConfig::default();
        assert!(policy.is_previewable("image/png"));
        assert!(policy.is_previewable("application/PDF"));
        assert!(policy.is_previewable("video/mp4"));
        assert!(!policy.is_previewable("application/zip"));

        let strict = PreviewConfig {
            include_media: false,
        };
        assert!(!strict.is_previewable("audio/mpeg"));
        assert!(strict.is_previewable("image/jpeg"));
    }
}
