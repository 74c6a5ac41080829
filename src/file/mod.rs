//! Filesystem traversal and mutation engine.
//!
//! This module provides:
//! - Path resolution against a configured base directory
//! - Metadata probing
//! - Fail-fast recursive listing and fail-soft recursive removal
//! - Streamed copy and copy-then-unlink move
//! - Upload staging

mod backend;
mod copier;
mod fanout;
mod probe;
mod remover;
mod resolver;
mod service;
mod staging;
mod walker;

pub use backend::{Filesystem, LocalFs};
pub use copier::{copy, move_file, COPY_CHANNEL_DEPTH, COPY_CHUNK_SIZE};
pub use fanout::FanOut;
pub use probe::{probe, EntryMetadata, FileEntry};
pub use remover::remove;
pub use resolver::{PathResolver, ResolvedPath};
pub use service::{basename, FileService};
pub use staging::{IncomingFile, StagedWriter, UploadStaging};
pub use walker::list;
