//! Filesystem access used by the traversal and copy engine.
//!
//! Every OS call the engine makes goes through [`Filesystem`], so the walker,
//! remover and copier can run against the host filesystem ([`LocalFs`]) or a
//! wrapper that injects failures on chosen paths.

use std::ffi::OsString;
use std::fs::Metadata;
use std::future::Future;
use std::io;
use std::path::Path;

use tokio::io::{AsyncRead, AsyncWrite};

/// Asynchronous filesystem primitives.
pub trait Filesystem: Send + Sync + 'static {
    /// Byte source returned by [`Filesystem::open_read`].
    type Reader: AsyncRead + Send + Unpin;
    /// Byte sink returned by [`Filesystem::create_write`].
    type Writer: AsyncWrite + Send + Unpin;

    /// Stat a path, following symlinks.
    fn metadata(&self, path: &Path) -> impl Future<Output = io::Result<Metadata>> + Send;

    /// Names of the immediate entries of a directory, in OS order.
    fn read_dir(&self, path: &Path) -> impl Future<Output = io::Result<Vec<OsString>>> + Send;

    fn remove_file(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;

    /// Remove an empty directory.
    fn remove_dir(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;

    /// Create or truncate `path` and write `contents` to it.
    fn write(&self, path: &Path, contents: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    fn create_dir_all(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;

    fn open_read(&self, path: &Path) -> impl Future<Output = io::Result<Self::Reader>> + Send;

    /// Create or truncate `path` for writing.
    fn create_write(&self, path: &Path) -> impl Future<Output = io::Result<Self::Writer>> + Send;
}

/// The host filesystem, through `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    type Reader = tokio::fs::File;
    type Writer = tokio::fs::File;

    async fn metadata(&self, path: &Path) -> io::Result<Metadata> {
        tokio::fs::metadata(path).await
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name());
        }
        Ok(names)
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    async fn remove_dir(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_dir(path).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        tokio::fs::write(path, contents).await
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn open_read(&self, path: &Path) -> io::Result<tokio::fs::File> {
        tokio::fs::File::open(path).await
    }

    async fn create_write(&self, path: &Path) -> io::Result<tokio::fs::File> {
        tokio::fs::File::create(path).await
    }
}
