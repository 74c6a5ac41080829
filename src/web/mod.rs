//! Web API module for Filedeck.
//!
//! An axum router exposing the [`crate::file`] engine under `/files`, with
//! optional static file serving for everything else.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
