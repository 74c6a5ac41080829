//! Filedeck - browse, read, write, upload and delete files on a server over HTTP.
//!
//! The [`file`] module holds the filesystem engine; [`web`] is the axum API
//! on top of it.

pub mod config;
pub mod datetime;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use config::Config;
pub use error::{AggregateError, FiledeckError, Result};
pub use file::{EntryMetadata, FileEntry, FileService, PathResolver, ResolvedPath};
pub use web::WebServer;
