//! Entry metadata snapshots.

use std::fs::Metadata;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::backend::Filesystem;
use super::resolver::ResolvedPath;
use crate::datetime;
use crate::{FiledeckError, Result};

/// Metadata of one filesystem entry, as seen when it was probed.
///
/// Nothing keeps it in sync with the disk afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryMetadata {
    pub is_directory: bool,
    pub is_file: bool,
    pub size: u64,
    pub accessed_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    /// Inode change time; the modification time on platforms without one.
    pub changed_at: Option<DateTime<Utc>>,
    /// Birth time, when the platform and filesystem record it.
    pub created_at: Option<DateTime<Utc>>,
}

impl EntryMetadata {
    pub fn from_metadata(meta: &Metadata) -> Self {
        let modified_at = meta.modified().ok().and_then(datetime::from_system_time);
        Self {
            is_directory: meta.is_dir(),
            is_file: meta.is_file(),
            size: meta.len(),
            accessed_at: meta.accessed().ok().and_then(datetime::from_system_time),
            modified_at,
            changed_at: changed_at(meta).or(modified_at),
            created_at: meta.created().ok().and_then(datetime::from_system_time),
        }
    }
}

#[cfg(unix)]
fn changed_at(meta: &Metadata) -> Option<DateTime<Utc>> {
    use std::os::unix::fs::MetadataExt;
    datetime::from_unix(meta.ctime(), meta.ctime_nsec())
}

#[cfg(not(unix))]
fn changed_at(_meta: &Metadata) -> Option<DateTime<Utc>> {
    None
}

/// A path together with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: ResolvedPath,
    pub stats: EntryMetadata,
}

/// Stat `path` once, with no retry.
pub async fn probe<F: Filesystem>(fs: &F, path: &ResolvedPath) -> Result<EntryMetadata> {
    fs.metadata(path)
        .await
        .map(|meta| EntryMetadata::from_metadata(&meta))
        .map_err(|e| FiledeckError::from_io(path.as_path(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::backend::LocalFs;
    use crate::file::resolver::PathResolver;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_probe_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("f.txt"), b"12345").unwrap();
        let resolver = PathResolver::new(temp.path()).unwrap();

        let stats = probe(&LocalFs, &resolver.resolve_one("f.txt")).await.unwrap();

        assert!(stats.is_file);
        assert!(!stats.is_directory);
        assert_eq!(stats.size, 5);
        assert!(stats.modified_at.is_some());
        assert!(stats.changed_at.is_some());
    }

    #[tokio::test]
    async fn test_probe_directory() {
        let temp = TempDir::new().unwrap();
        let resolver = PathResolver::new(temp.path()).unwrap();

        let stats = probe(&LocalFs, &resolver.base()).await.unwrap();

        assert!(stats.is_directory);
        assert!(!stats.is_file);
    }

    #[tokio::test]
    async fn test_probe_not_found() {
        let temp = TempDir::new().unwrap();
        let resolver = PathResolver::new(temp.path()).unwrap();
        let missing = resolver.resolve_one("missing");

        let err = probe(&LocalFs, &missing).await.unwrap_err();

        assert!(matches!(err, FiledeckError::NotFound(ref p) if p == missing.as_path()));
    }

    #[tokio::test]
    async fn test_metadata_serializes_flags() {
        let temp = TempDir::new().unwrap();
        let resolver = PathResolver::new(temp.path()).unwrap();
        let stats = probe(&LocalFs, &resolver.base()).await.unwrap();

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["is_directory"], true);
        assert_eq!(json["is_file"], false);
    }
}
