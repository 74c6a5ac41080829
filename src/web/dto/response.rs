//! Response DTOs for the file API.

use std::path::Path;

use serde::Serialize;

use crate::datetime::to_rfc3339;
use crate::file::{EntryMetadata, FileEntry};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Entry metadata as sent to clients; timestamps are RFC3339.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub is_directory: bool,
    pub is_file: bool,
    pub size: u64,
    pub accessed_at: Option<String>,
    pub modified_at: Option<String>,
    pub changed_at: Option<String>,
    pub created_at: Option<String>,
}

impl From<&EntryMetadata> for StatsResponse {
    fn from(stats: &EntryMetadata) -> Self {
        Self {
            is_directory: stats.is_directory,
            is_file: stats.is_file,
            size: stats.size,
            accessed_at: stats.accessed_at.as_ref().map(to_rfc3339),
            modified_at: stats.modified_at.as_ref().map(to_rfc3339),
            changed_at: stats.changed_at.as_ref().map(to_rfc3339),
            created_at: stats.created_at.as_ref().map(to_rfc3339),
        }
    }
}

/// A path with its metadata (write, mkdir and upload results).
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub path: String,
    pub stats: StatsResponse,
}

impl From<&FileEntry> for EntryResponse {
    fn from(entry: &FileEntry) -> Self {
        Self {
            path: entry.path.to_string(),
            stats: StatsResponse::from(&entry.stats),
        }
    }
}

/// One row of a directory listing.
#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub path: String,
    pub basename: String,
    #[serde(flatten)]
    pub stats: StatsResponse,
}

impl From<&FileEntry> for FileResponse {
    fn from(entry: &FileEntry) -> Self {
        Self {
            path: entry.path.to_string(),
            basename: entry.path.basename(),
            stats: StatsResponse::from(&entry.stats),
        }
    }
}

/// Listing of a path.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    /// The path as requested.
    pub path: String,
    pub files: Vec<FileResponse>,
    /// Parent of the requested path, computed from the request string.
    pub parent_directory: String,
}

impl ListResponse {
    pub fn new(path: String, entries: &[FileEntry]) -> Self {
        let parent_directory = parent_directory(&path);
        Self {
            files: entries.iter().map(FileResponse::from).collect(),
            path,
            parent_directory,
        }
    }
}

/// Directory part of a client path, with POSIX `dirname` conventions.
///
/// `"a/b"` gives `"a"`, a bare name gives `"."`, and the root stays `"/"`.
pub fn parent_directory(path: &str) -> String {
    let path = Path::new(path);
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => ".".to_string(),
        Some(parent) => parent.to_string_lossy().into_owned(),
        None if path.has_root() => path.to_string_lossy().into_owned(),
        None => ".".to_string(),
    }
}
