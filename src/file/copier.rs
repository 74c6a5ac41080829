//! Streamed file copy and copy-then-unlink move.
//!
//! The copy runs a reader and a writer side by side, joined by a bounded
//! channel of chunks. Whichever side fails first ends the copy and drops the
//! other. A failed copy may leave a truncated destination behind.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::debug;

use super::backend::Filesystem;
use super::resolver::ResolvedPath;
use crate::{FiledeckError, Result};

/// Size of one chunk handed from the reader to the writer.
pub const COPY_CHUNK_SIZE: usize = 64 * 1024;

/// Chunks buffered between reader and writer.
pub const COPY_CHANNEL_DEPTH: usize = 4;

/// Copy the bytes of `source` into `destination`, creating or truncating it.
///
/// Resolves once the destination has been flushed and closed.
pub async fn copy<F: Filesystem>(
    fs: &F,
    source: &ResolvedPath,
    destination: &ResolvedPath,
) -> Result<()> {
    let fail = |e| FiledeckError::copy_failure(source, destination, e);

    let mut reader = fs.open_read(source).await.map_err(fail)?;
    let mut writer = fs.create_write(destination).await.map_err(fail)?;

    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(COPY_CHANNEL_DEPTH);

    let read_side = async move {
        loop {
            let mut chunk = vec![0u8; COPY_CHUNK_SIZE];
            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                return Ok::<u64, std::io::Error>(0);
            }
            chunk.truncate(n);
            if tx.send(chunk).await.is_err() {
                // Writer is gone; its own error is what gets reported.
                return Ok(0);
            }
        }
    };

    let write_side = async move {
        let mut written = 0u64;
        while let Some(chunk) = rx.recv().await {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        writer.shutdown().await?;
        Ok::<u64, std::io::Error>(written)
    };

    let (_, written) = tokio::try_join!(read_side, write_side).map_err(fail)?;
    debug!(source = %source, destination = %destination, bytes = written, "Copied file");
    Ok(())
}

/// Copy `source` to `destination`, then unlink `source`.
///
/// The two steps are not atomic. If the unlink fails the error is returned
/// and both files remain.
pub async fn move_file<F: Filesystem>(
    fs: &F,
    source: &ResolvedPath,
    destination: &ResolvedPath,
) -> Result<()> {
    copy(fs, source, destination).await?;
    fs.remove_file(source)
        .await
        .map_err(|e| FiledeckError::from_io(source.as_path(), e))?;
    debug!(source = %source, destination = %destination, "Moved file");
    Ok(())
}
