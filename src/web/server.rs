//! Web server for Filedeck.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::{Config, WebConfig};
use crate::file::{FileService, PathResolver, UploadStaging};
use crate::{FiledeckError, Result};

use super::handlers::AppState;
use super::router::create_router;

/// Web server for the file API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Web configuration.
    web_config: WebConfig,
}

impl WebServer {
    /// Create a new web server.
    ///
    /// Resolves the base directory and creates the upload staging area.
    pub async fn new(config: &Config) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| {
                FiledeckError::Config(format!(
                    "invalid server address {}:{}: {e}",
                    config.server.host, config.server.port
                ))
            })?;

        let resolver = PathResolver::new(&config.files.base_directory)?;
        let staging = UploadStaging::new(
            &resolver,
            &config.files.upload_staging_path,
            config.max_upload_size_bytes(),
        )
        .await?;
        tracing::info!(
            base = %resolver.base(),
            staging = %staging.dir(),
            "File service initialized"
        );

        let files =
            FileService::local(resolver).with_max_concurrent_ops(config.files.max_concurrent_ops);

        Ok(Self {
            addr,
            app_state: Arc::new(AppState::new(files, staging)),
            web_config: config.web.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Build the application router.
    pub fn router(&self) -> Router {
        create_router(self.app_state.clone(), &self.web_config)
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> std::io::Result<()> {
        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router).await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
