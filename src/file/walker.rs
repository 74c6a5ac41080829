//! Recursive directory listing.
//!
//! The walk is fail-fast: the first stat or readdir error anywhere aborts the
//! whole listing, and entries gathered by other branches are dropped with it.
//! This is the opposite of [`remove`](super::remover::remove), which keeps going
//! past failures.

use futures::future::{try_join_all, BoxFuture};
use futures::stream::{FuturesUnordered, TryStreamExt};
use futures::FutureExt;
use tracing::debug;

use super::backend::Filesystem;
use super::fanout::FanOut;
use super::probe::{probe, FileEntry};
use super::resolver::ResolvedPath;
use crate::{FiledeckError, Result};

/// List `path`.
///
/// A non-directory yields itself as the only entry. A directory yields its
/// children (not itself), plus every descendant when `recursive` is set.
/// Entries come back in the order their stat calls finished, so callers must
/// not rely on ordering.
pub async fn list<F: Filesystem>(
    fs: &F,
    fan_out: &FanOut,
    path: &ResolvedPath,
    recursive: bool,
) -> Result<Vec<FileEntry>> {
    let stats = fan_out.run(probe(fs, path)).await?;
    if !stats.is_directory {
        return Ok(vec![FileEntry {
            path: path.clone(),
            stats,
        }]);
    }

    let entries = walk_directory(fs, fan_out, path.clone(), recursive).await?;
    debug!(path = %path, count = entries.len(), recursive, "Listed directory");
    Ok(entries)
}

/// One directory level: stat every child concurrently, then descend into the
/// child directories concurrently.
fn walk_directory<'a, F: Filesystem>(
    fs: &'a F,
    fan_out: &'a FanOut,
    dir: ResolvedPath,
    recursive: bool,
) -> BoxFuture<'a, Result<Vec<FileEntry>>> {
    async move {
        let names = fan_out
            .run(fs.read_dir(&dir))
            .await
            .map_err(|e| FiledeckError::from_io(dir.as_path(), e))?;

        let mut pending: FuturesUnordered<_> = names
            .into_iter()
            .map(|name| {
                let child = dir.join(name);
                async move {
                    let stats = fan_out.run(probe(fs, &child)).await?;
                    Ok::<_, FiledeckError>(FileEntry { path: child, stats })
                }
            })
            .collect();

        let mut entries = Vec::with_capacity(pending.len());
        let mut subdirectories = Vec::new();
        while let Some(entry) = pending.try_next().await? {
            if recursive && entry.stats.is_directory {
                subdirectories.push(entry.path.clone());
            }
            entries.push(entry);
        }

        if !subdirectories.is_empty() {
            let nested = try_join_all(
                subdirectories
                    .into_iter()
                    .map(|sub| walk_directory(fs, fan_out, sub, recursive)),
            )
            .await?;
            entries.extend(nested.into_iter().flatten());
        }

        Ok(entries)
    }
    .boxed()
}
