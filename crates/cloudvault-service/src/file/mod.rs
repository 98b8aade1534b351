//! File services: facade operations, uploads and listing enrichment.

pub mod preview;
pub mod service;
pub mod upload;

pub use preview::{FileEnricher, FileView};
pub use service::{FileDownload, FileService};
pub use upload::{UploadRequest, UploadService};
