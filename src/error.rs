//! Error types for Filedeck.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Common error type for Filedeck.
#[derive(Error, Debug)]
pub enum FiledeckError {
    /// The path does not exist.
    #[error("no such file or directory: {}", .0.display())]
    NotFound(PathBuf),

    /// The OS refused access to the path.
    #[error("permission denied: {}", .0.display())]
    AccessDenied(PathBuf),

    /// A directory operation was applied to something that is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A file operation was applied to a directory.
    #[error("is a directory: {}", .0.display())]
    IsADirectory(PathBuf),

    /// A directory could not be removed because it still has entries.
    #[error("directory not empty: {}", .0.display())]
    DirectoryNotEmpty(PathBuf),

    /// The target already exists.
    #[error("already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// Streaming bytes from one file into another failed.
    #[error("copy from {} to {} failed: {cause}", .from.display(), .to.display())]
    CopyFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        cause: io::Error,
    },

    /// Several failures collected over a whole tree traversal.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// Any other OS-level failure on a known path.
    #[error("I/O error on {}: {source}", .path.display())]
    PathIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O error without a path (configuration, logging setup).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),
}

impl FiledeckError {
    /// Classify an OS error raised while operating on `path`.
    pub fn from_io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => FiledeckError::NotFound(path),
            io::ErrorKind::PermissionDenied => FiledeckError::AccessDenied(path),
            io::ErrorKind::NotADirectory => FiledeckError::NotADirectory(path),
            io::ErrorKind::IsADirectory => FiledeckError::IsADirectory(path),
            io::ErrorKind::DirectoryNotEmpty => FiledeckError::DirectoryNotEmpty(path),
            io::ErrorKind::AlreadyExists => FiledeckError::AlreadyExists(path),
            _ => FiledeckError::PathIo { path, source: err },
        }
    }

    /// Build a copy failure for the `from` -> `to` pair.
    pub fn copy_failure(from: &Path, to: &Path, cause: io::Error) -> Self {
        FiledeckError::CopyFailure {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            cause,
        }
    }

    /// The path this error is about, when it has one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            FiledeckError::NotFound(p)
            | FiledeckError::AccessDenied(p)
            | FiledeckError::NotADirectory(p)
            | FiledeckError::IsADirectory(p)
            | FiledeckError::DirectoryNotEmpty(p)
            | FiledeckError::AlreadyExists(p) => Some(p),
            FiledeckError::PathIo { path, .. } => Some(path),
            FiledeckError::CopyFailure { from, .. } => Some(from),
            _ => None,
        }
    }
}

/// Ordered collection of failures raised once, after a traversal finished.
#[derive(Debug)]
pub struct AggregateError {
    causes: Vec<FiledeckError>,
}

impl AggregateError {
    /// Wrap the collected causes; `None` when nothing failed.
    pub fn from_causes(causes: Vec<FiledeckError>) -> Option<Self> {
        if causes.is_empty() {
            None
        } else {
            Some(Self { causes })
        }
    }

    /// The collected causes, in the order they were recorded.
    pub fn causes(&self) -> &[FiledeckError] {
        &self.causes
    }

    pub fn len(&self) -> usize {
        self.causes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.causes.is_empty()
    }

    pub fn into_causes(self) -> Vec<FiledeckError> {
        self.causes
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Errors occurred:")?;
        for cause in &self.causes {
            write!(f, "\n\n{cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

/// Result type alias for Filedeck operations.
pub type Result<T> = std::result::Result<T, FiledeckError>;
