//! Upload staging area.
//!
//! Incoming multipart files are first written here under a fresh
//! UUID-based name, then moved into their target directory:
//! ```text
//! {staging_path}/
//! ├── ab12cd34-5678-90ab-cdef-123456789012.txt
//! ├── cd90ab12-3456-7890-abcd-ef1234567890.bin
//! └── ...
//! ```

use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::resolver::{PathResolver, ResolvedPath};
use crate::{FiledeckError, Result};

/// A file received from a client, waiting in the staging area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    /// Where the bytes currently are.
    pub temp_path: ResolvedPath,
    /// File name as sent by the client, possibly with directory components.
    pub original_name: String,
}

/// Staging directory for uploads.
#[derive(Debug, Clone)]
pub struct UploadStaging {
    dir: ResolvedPath,
    max_file_size: u64,
}

impl UploadStaging {
    /// Create the staging area at `path` (resolved like any request path).
    ///
    /// The directory will be created if it doesn't exist.
    pub async fn new(resolver: &PathResolver, path: &str, max_file_size: u64) -> Result<Self> {
        let dir = resolver.resolve_one(path);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| FiledeckError::from_io(dir.as_path(), e))?;
        Ok(Self { dir, max_file_size })
    }

    pub fn dir(&self) -> &ResolvedPath {
        &self.dir
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Open a new, empty staged file for `original_name`.
    pub async fn create(&self, original_name: &str) -> Result<StagedWriter> {
        let path = self.dir.join(Self::generate_staged_name(original_name));
        let file = File::create(&path)
            .await
            .map_err(|e| FiledeckError::from_io(path.as_path(), e))?;
        Ok(StagedWriter {
            file,
            incoming: IncomingFile {
                temp_path: path,
                original_name: original_name.to_string(),
            },
            written: 0,
            limit: self.max_file_size,
        })
    }

    /// Delete staged files that will not be moved. Files already gone are
    /// skipped; other failures are only logged.
    pub async fn discard(&self, files: &[IncomingFile]) {
        for file in files {
            match tokio::fs::remove_file(&file.temp_path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %file.temp_path, error = %e, "Failed to discard staged upload");
                }
            }
        }
    }

    /// Generate a new UUID-based staged name keeping the original extension.
    pub fn generate_staged_name(original_name: &str) -> String {
        let uuid = Uuid::new_v4();
        let ext = Self::extract_extension(original_name);
        format!("{uuid}.{ext}")
    }

    /// Extract the file extension from a filename.
    ///
    /// Returns "bin" if no extension is found.
    fn extract_extension(filename: &str) -> &str {
        Path::new(filename)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("bin")
    }
}

/// Writes one upload into the staging area, enforcing the size limit.
#[derive(Debug)]
pub struct StagedWriter {
    file: File,
    incoming: IncomingFile,
    written: u64,
    limit: u64,
}

impl StagedWriter {
    pub fn incoming(&self) -> &IncomingFile {
        &self.incoming
    }

    /// Append a chunk; fails once the upload grows past the limit.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.written += chunk.len() as u64;
        if self.written > self.limit {
            return Err(FiledeckError::Validation(format!(
                "file too large (max {}MB)",
                self.limit / 1024 / 1024
            )));
        }
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| FiledeckError::from_io(self.incoming.temp_path.as_path(), e))
    }

    /// Flush and close the staged file.
    pub async fn finish(mut self) -> Result<IncomingFile> {
        let path = self.incoming.temp_path.clone();
        self.file
            .flush()
            .await
            .map_err(|e| FiledeckError::from_io(path.as_path(), e))?;
        self.file
            .shutdown()
            .await
            .map_err(|e| FiledeckError::from_io(path.as_path(), e))?;
        Ok(self.incoming)
    }
}
