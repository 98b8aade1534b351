//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use cloudvault_core::error::AppError;
use cloudvault_core::types::DirectoryRef;

/// Create directory request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDirectoryRequest {
    /// Directory name.
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
    /// Parent directory; `"root"` or omitted for the caller's root.
    #[serde(default)]
    pub parent: DirectoryRef,
}

/// Rename request for directories and files.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenameRequest {
    /// New name.
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
}

/// Move request for directories and files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Destination directory; `"root"` for the caller's root.
    pub parent: DirectoryRef,
}

/// Share request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShareRequest {
    /// Email of the user to share with.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Query parameters of `POST /api/files`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadQuery {
    /// Target directory; the caller's root when omitted.
    #[serde(default)]
    pub directory: DirectoryRef,
    /// File name.
    #[serde(default)]
    pub name: Option<String>,
    /// Client-side relative path such as `photos/2024/beach.jpg`.
    #[serde(default)]
    pub relative_path: Option<String>,
}

/// Query parameters of `GET /api/files/{id}/download`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadQuery {
    /// Ask for inline display instead of an attachment.
    #[serde(default)]
    pub inline: bool,
}

/// Run derive-based validation, flattening the field messages.
pub fn validate_body<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate().map_err(|errors| {
        let messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid {field}"),
                })
            })
            .collect();
        AppError::validation(messages.join("; "))
    })
}
