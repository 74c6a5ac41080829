//! Router configuration for the Web API.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    handler::HandlerWithoutStateExt,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

use super::error::ApiError;
use super::handlers::{
    copy_path, health_check, list_files, make_directory, move_path, read_file, remove_path,
    upload_files, write_file, AppState,
};
use super::middleware::{create_cors_layer, security_headers};
use crate::config::WebConfig;

/// Create the `/files` routes.
pub fn create_file_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ls", get(list_files))
        .route("/read", get(read_file))
        .route("/write", post(write_file))
        .route("/mkdir", post(make_directory))
        .route("/upload", post(upload_files))
        .route("/rm", delete(remove_path))
        .route("/cp", post(copy_path))
        .route("/mv", post(move_path))
}

/// Create the full application router.
///
/// Unmatched requests are served from `static_path` when static serving is
/// enabled, and answered with a JSON 404 otherwise or when no file matches.
pub fn create_router(app_state: Arc<AppState>, config: &WebConfig) -> Router {
    let router = Router::new()
        .nest("/files", create_file_router())
        .route("/health", get(health_check));

    let router = if config.serve_static {
        let static_files = ServeDir::new(&config.static_path)
            .not_found_service(not_found.into_service());
        router.fallback_service(static_files)
    } else {
        router.fallback(not_found)
    };

    let body_limit = usize::try_from(config.max_body_size_mb * 1024 * 1024).unwrap_or(usize::MAX);

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(&config.cors_origins))
                .layer(middleware::from_fn(security_headers))
                .layer(CompressionLayer::new())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(app_state)
}

/// Fallback for routes and static files that do not exist.
async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}
