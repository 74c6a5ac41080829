//! Configuration module for Filedeck.

use serde::Deserialize;
use std::path::Path;

use crate::{FiledeckError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Filesystem access configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Directory every request path is resolved against.
    #[serde(default = "default_base_directory")]
    pub base_directory: String,
    /// Directory where multipart uploads are staged before being moved.
    #[serde(default = "default_upload_staging_path")]
    pub upload_staging_path: String,
    /// Maximum size of a single uploaded file in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Maximum in-flight filesystem calls per tree walk or removal (0 = unbounded).
    #[serde(default)]
    pub max_concurrent_ops: usize,
}

fn default_base_directory() -> String {
    ".".to_string()
}

fn default_upload_staging_path() -> String {
    "uploads".to_string()
}

fn default_max_upload_size() -> u64 {
    100
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            base_directory: default_base_directory(),
            upload_staging_path: default_upload_staging_path(),
            max_upload_size_mb: default_max_upload_size(),
            max_concurrent_ops: 0,
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Whether to serve static files for unmatched routes.
    #[serde(default = "default_serve_static")]
    pub serve_static: bool,
    /// Path to static files directory.
    #[serde(default = "default_static_path")]
    pub static_path: String,
    /// Maximum request body size in megabytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size_mb: u64,
}

fn default_serve_static() -> bool {
    true
}

fn default_static_path() -> String {
    "static".to_string()
}

fn default_max_body_size() -> u64 {
    100
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec![],
            serve_static: default_serve_static(),
            static_path: default_static_path(),
            max_body_size_mb: default_max_body_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file; console only when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Filesystem access configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FiledeckError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FiledeckError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILEDECK_BASE_DIRECTORY`: directory request paths resolve against
    /// - `FILEDECK_PORT`: listening port
    pub fn apply_env_overrides(&mut self) {
        if let Ok(base) = std::env::var("FILEDECK_BASE_DIRECTORY") {
            if !base.is_empty() {
                self.files.base_directory = base;
            }
        }

        if let Ok(port) = std::env::var("FILEDECK_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid FILEDECK_PORT"),
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.files.base_directory.trim().is_empty() {
            return Err(FiledeckError::Config(
                "files.base_directory must not be empty".to_string(),
            ));
        }
        if self.files.max_upload_size_mb == 0 {
            return Err(FiledeckError::Config(
                "files.max_upload_size_mb must be greater than 0".to_string(),
            ));
        }
        if self.web.serve_static && self.web.static_path.trim().is_empty() {
            return Err(FiledeckError::Config(
                "web.static_path must be set when web.serve_static is enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Maximum upload size in bytes.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.files.max_upload_size_mb * 1024 * 1024
    }
}
