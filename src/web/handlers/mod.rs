//! API handlers for the file API.

pub mod files;
pub mod health;

pub use files::*;
pub use health::*;

use crate::file::{FileService, UploadStaging};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Filesystem operations rooted at the base directory.
    pub files: FileService,
    /// Where multipart uploads are written before being moved.
    pub staging: UploadStaging,
}

impl AppState {
    /// Create a new application state.
    pub fn new(files: FileService, staging: UploadStaging) -> Self {
        Self { files, staging }
    }
}
