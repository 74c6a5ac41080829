//! Request DTOs for the file API.

use serde::Deserialize;
use validator::Validate;

use super::validation::valid_path;

fn default_path() -> String {
    ".".to_string()
}

/// Query for `GET /files/ls`.
#[derive(Debug, Deserialize, Validate)]
pub struct ListQuery {
    /// Path to list; the base directory when omitted.
    #[serde(default = "default_path")]
    #[validate(custom(function = "valid_path"))]
    pub path: String,
    /// Descend into subdirectories.
    #[serde(default)]
    pub recursive: bool,
}

/// Query for `GET /files/read`.
#[derive(Debug, Deserialize, Validate)]
pub struct ReadQuery {
    #[validate(custom(function = "valid_path"))]
    pub path: String,
}

/// Query for `DELETE /files/rm`.
///
/// An empty path is rejected rather than resolved to the base directory.
#[derive(Debug, Deserialize, Validate)]
pub struct RemoveQuery {
    #[validate(custom(function = "valid_path"))]
    pub path: String,
    /// Remove directory contents too.
    #[serde(default)]
    pub recursive: bool,
}

/// Body of `POST /files/write`.
#[derive(Debug, Deserialize, Validate)]
pub struct WriteRequest {
    #[validate(custom(function = "valid_path"))]
    pub path: String,
    /// New file contents.
    #[serde(default)]
    pub contents: String,
}

/// Body of `POST /files/mkdir`.
#[derive(Debug, Deserialize, Validate)]
pub struct MkdirRequest {
    #[validate(custom(function = "valid_path"))]
    pub path: String,
}

/// Body of `POST /files/cp` and `POST /files/mv`.
#[derive(Debug, Deserialize, Validate)]
pub struct TransferRequest {
    #[validate(custom(function = "valid_path"))]
    pub source: String,
    #[validate(custom(function = "valid_path"))]
    pub destination: String,
}
