//! Request path resolution.
//!
//! Paths coming from clients are joined onto a configured base directory and
//! lexically normalized. Nothing here touches the filesystem, and nothing here
//! keeps the result under the base directory: `..` segments may climb out of
//! it and absolute segments replace it, exactly like a shell `cd` would.

use std::ffi::OsStr;
use std::fmt;
use std::io;
use std::ops::Deref;
use std::path::{Component, Path, PathBuf};

use serde::{Serialize, Serializer};

/// An absolute, normalized filesystem path.
///
/// Only [`PathResolver`] (and [`ResolvedPath::join`]) produce these, so every
/// value has gone through the same normalization. No existence or safety
/// guarantee is implied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }

    /// Resolve `segment` relative to this path.
    pub fn join(&self, segment: impl AsRef<Path>) -> ResolvedPath {
        ResolvedPath(normalize(&self.0.join(segment)))
    }

    /// Final component, or the whole path for the root.
    pub fn basename(&self) -> String {
        self.0
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.to_string_lossy().into_owned())
    }
}

impl Deref for ResolvedPath {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl Serialize for ResolvedPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string_lossy())
    }
}

/// Resolves client-supplied path strings against a fixed base directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base: PathBuf,
}

impl PathResolver {
    /// Create a resolver rooted at `base`.
    ///
    /// A relative `base` is anchored at the process working directory once,
    /// here, so later resolutions never consult ambient process state.
    pub fn new(base: impl AsRef<Path>) -> io::Result<Self> {
        let base = base.as_ref();
        let absolute = if base.is_absolute() {
            base.to_path_buf()
        } else {
            std::env::current_dir()?.join(base)
        };
        Ok(Self {
            base: normalize(&absolute),
        })
    }

    /// The normalized base directory.
    pub fn base(&self) -> ResolvedPath {
        ResolvedPath(self.base.clone())
    }

    /// Join `segments` onto the base directory, left to right.
    ///
    /// Empty segments are ignored; an absolute segment discards everything
    /// before it. `.` and `..` are collapsed lexically.
    pub fn resolve<I, S>(&self, segments: I) -> ResolvedPath
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut joined = self.base.clone();
        for segment in segments {
            let segment = segment.as_ref();
            if segment.is_empty() {
                continue;
            }
            joined.push(segment);
        }
        ResolvedPath(normalize(&joined))
    }

    /// Resolve a single client path.
    pub fn resolve_one(&self, path: impl AsRef<OsStr>) -> ResolvedPath {
        self.resolve([path])
    }
}

/// Collapse `.` and `..` without touching the filesystem.
///
/// `..` at the root stays at the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}
