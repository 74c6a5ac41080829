//! Recursive removal that keeps going past failures.
//!
//! Every node's error is recorded and the traversal carries on with its
//! siblings and unrelated subtrees. Children are always removed before their
//! parent. Once everything has been attempted, the recorded errors are raised
//! together as one [`AggregateError`].

use std::sync::Mutex;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tracing::{debug, warn};

use super::backend::Filesystem;
use super::fanout::FanOut;
use super::probe::probe;
use super::resolver::ResolvedPath;
use crate::error::AggregateError;
use crate::{FiledeckError, Result};

/// Remove `path`.
///
/// Files are unlinked. A directory is removed with `rmdir`, after its whole
/// subtree when `recursive` is set; without `recursive` a non-empty directory
/// fails with [`FiledeckError::DirectoryNotEmpty`].
///
/// A failure of the very first stat (for example a missing `path`) is returned
/// as is. Any later failure is collected, and a directory that still holds a
/// child it could not remove is left in place without an extra `rmdir` error.
pub async fn remove<F: Filesystem>(
    fs: &F,
    fan_out: &FanOut,
    path: &ResolvedPath,
    recursive: bool,
) -> Result<()> {
    let stats = fan_out.run(probe(fs, path)).await?;

    let remover = TreeRemover {
        fs,
        fan_out,
        recursive,
        errors: Mutex::new(Vec::new()),
    };
    if stats.is_directory {
        remover.remove_directory(path.clone()).await;
    } else {
        remover.unlink(path).await;
    }

    let errors = remover.errors.into_inner().unwrap_or_else(|e| e.into_inner());
    match AggregateError::from_causes(errors) {
        Some(aggregate) => Err(aggregate.into()),
        None => {
            debug!(path = %path, recursive, "Removed");
            Ok(())
        }
    }
}

struct TreeRemover<'a, F> {
    fs: &'a F,
    fan_out: &'a FanOut,
    recursive: bool,
    errors: Mutex<Vec<FiledeckError>>,
}

impl<'a, F: Filesystem> TreeRemover<'a, F> {
    fn record(&self, err: FiledeckError) {
        warn!(error = %err, "Removal step failed");
        self.errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(err);
    }

    /// Remove one entry of unknown type. Returns whether it is gone.
    fn remove_entry<'s>(&'s self, path: ResolvedPath) -> BoxFuture<'s, bool> {
        async move {
            match self.fan_out.run(probe(self.fs, &path)).await {
                Ok(stats) if stats.is_directory => self.remove_directory(path).await,
                Ok(_) => self.unlink(&path).await,
                Err(err) => {
                    self.record(err);
                    false
                }
            }
        }
        .boxed()
    }

    /// Remove a directory, and its subtree first when recursive.
    fn remove_directory<'s>(&'s self, dir: ResolvedPath) -> BoxFuture<'s, bool> {
        async move {
            if self.recursive {
                let names = match self.fan_out.run(self.fs.read_dir(&dir)).await {
                    Ok(names) => names,
                    Err(e) => {
                        self.record(FiledeckError::from_io(dir.as_path(), e));
                        return false;
                    }
                };

                let removed = join_all(
                    names
                        .into_iter()
                        .map(|name| self.remove_entry(dir.join(name))),
                )
                .await;

                // rmdir cannot succeed while a child is still there.
                if removed.iter().any(|gone| !gone) {
                    return false;
                }
            }

            match self.fan_out.run(self.fs.remove_dir(&dir)).await {
                Ok(()) => true,
                Err(e) => {
                    self.record(FiledeckError::from_io(dir.as_path(), e));
                    false
                }
            }
        }
        .boxed()
    }

    async fn unlink(&self, path: &ResolvedPath) -> bool {
        match self.fan_out.run(self.fs.remove_file(path)).await {
            Ok(()) => true,
            Err(e) => {
                self.record(FiledeckError::from_io(path.as_path(), e));
                false
            }
        }
    }
}
