//! Filesystem operations behind the HTTP API.
//!
//! [`FileService`] resolves client paths against the configured base
//! directory and runs the walker, remover and copier on them.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::info;

use super::backend::{Filesystem, LocalFs};
use super::copier;
use super::fanout::FanOut;
use super::probe::{probe, EntryMetadata, FileEntry};
use super::remover;
use super::resolver::{PathResolver, ResolvedPath};
use super::staging::IncomingFile;
use super::walker;
use crate::{FiledeckError, Result};

/// Entry points of the file API.
#[derive(Debug)]
pub struct FileService<F = LocalFs> {
    resolver: PathResolver,
    fs: Arc<F>,
    fan_out: FanOut,
}

impl<F> Clone for FileService<F> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            fs: self.fs.clone(),
            fan_out: self.fan_out.clone(),
        }
    }
}

impl FileService<LocalFs> {
    /// Service over the host filesystem.
    pub fn local(resolver: PathResolver) -> Self {
        Self::new(resolver, LocalFs)
    }
}

impl<F: Filesystem> FileService<F> {
    pub fn new(resolver: PathResolver, fs: F) -> Self {
        Self {
            resolver,
            fs: Arc::new(fs),
            fan_out: FanOut::unbounded(),
        }
    }

    /// Cap in-flight filesystem calls per walk or removal (`0` = unbounded).
    pub fn with_max_concurrent_ops(mut self, max: usize) -> Self {
        self.fan_out = FanOut::bounded(max);
        self
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    /// Resolve a client path against the base directory.
    pub fn resolve(&self, path: &str) -> ResolvedPath {
        self.resolver.resolve_one(path)
    }

    /// Stat a client path.
    pub async fn stat(&self, path: &str) -> Result<(ResolvedPath, EntryMetadata)> {
        let resolved = self.resolve(path);
        let stats = probe(self.fs.as_ref(), &resolved).await?;
        Ok((resolved, stats))
    }

    /// List a file or directory, optionally the whole tree below it.
    pub async fn list(&self, path: &str, recursive: bool) -> Result<Vec<FileEntry>> {
        let resolved = self.resolve(path);
        walker::list(self.fs.as_ref(), &self.fan_out, &resolved, recursive).await
    }

    /// Resolve a path for reading and check that it is a regular file.
    pub async fn read(&self, path: &str) -> Result<ResolvedPath> {
        let (resolved, stats) = self.stat(path).await?;
        if stats.is_directory {
            return Err(FiledeckError::IsADirectory(resolved.into_path_buf()));
        }
        Ok(resolved)
    }

    /// Write `contents` to a file, then stat it.
    pub async fn write(&self, path: &str, contents: &[u8]) -> Result<FileEntry> {
        let resolved = self.resolve(path);
        self.fs
            .write(&resolved, contents)
            .await
            .map_err(|e| FiledeckError::from_io(resolved.as_path(), e))?;
        let stats = probe(self.fs.as_ref(), &resolved).await?;
        info!(path = %resolved, size = stats.size, "Wrote file");
        Ok(FileEntry {
            path: resolved,
            stats,
        })
    }

    /// Create a directory and any missing parents.
    pub async fn mkdir(&self, path: &str) -> Result<FileEntry> {
        let resolved = self.resolve(path);
        self.fs
            .create_dir_all(&resolved)
            .await
            .map_err(|e| FiledeckError::from_io(resolved.as_path(), e))?;
        let stats = probe(self.fs.as_ref(), &resolved).await?;
        info!(path = %resolved, "Created directory");
        Ok(FileEntry {
            path: resolved,
            stats,
        })
    }

    /// Move staged uploads into `target_directory`, each under the last
    /// component of its client-supplied name.
    pub async fn upload(
        &self,
        target_directory: &str,
        incoming: Vec<IncomingFile>,
    ) -> Result<Vec<FileEntry>> {
        let moves = incoming.into_iter().map(|file| async move {
            let destination = self
                .resolver
                .resolve([target_directory, basename(&file.original_name)]);
            copier::move_file(self.fs.as_ref(), &file.temp_path, &destination).await?;
            let stats = probe(self.fs.as_ref(), &destination).await?;
            info!(path = %destination, size = stats.size, "Stored upload");
            Ok::<_, FiledeckError>(FileEntry {
                path: destination,
                stats,
            })
        });
        try_join_all(moves).await
    }

    /// Remove a file or directory tree.
    pub async fn remove(&self, path: &str, recursive: bool) -> Result<()> {
        let resolved = self.resolve(path);
        remover::remove(self.fs.as_ref(), &self.fan_out, &resolved, recursive).await?;
        info!(path = %resolved, recursive, "Removed");
        Ok(())
    }

    pub async fn copy(&self, source: &str, destination: &str) -> Result<()> {
        let source = self.resolve(source);
        let destination = self.resolve(destination);
        copier::copy(self.fs.as_ref(), &source, &destination).await
    }

    /// Copy then unlink the source; not atomic.
    pub async fn move_file(&self, source: &str, destination: &str) -> Result<()> {
        let source = self.resolve(source);
        let destination = self.resolve(destination);
        copier::move_file(self.fs.as_ref(), &source, &destination).await
    }
}

/// Last `/`-separated component of `name`, ignoring trailing slashes.
///
/// Only the final component is kept; it is not otherwise sanitized, so names
/// like `..` pass through unchanged. A name made only of slashes has an empty
/// basename.
pub fn basename(name: &str) -> &str {
    let trimmed = name.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}
