//! File handlers for the Web API.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Request, State},
    http::StatusCode,
    response::Response,
    Json,
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::file::{IncomingFile, UploadStaging};
use crate::web::dto::{
    ApiResponse, EntryResponse, ListQuery, ListResponse, MkdirRequest, ReadQuery, RemoveQuery,
    TransferRequest, ValidatedJson, ValidatedQuery, WriteRequest,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::FiledeckError;

/// Name of the multipart text field holding the target directory.
const UPLOAD_PATH_FIELD: &str = "path";

/// GET /files/ls - List a file or directory.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<ListQuery>,
) -> Result<Json<ApiResponse<ListResponse>>, ApiError> {
    let entries = state.files.list(&query.path, query.recursive).await?;
    Ok(Json(ApiResponse::new(ListResponse::new(query.path, &entries))))
}

/// GET /files/read - Stream a file's contents.
///
/// Content type, ranges and conditional requests are handled by `ServeFile`.
pub async fn read_file(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<ReadQuery>,
    request: Request,
) -> Result<Response, ApiError> {
    let path = state.files.read(&query.path).await?;

    let response = ServeFile::new(path.as_path())
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});

    Ok(response.map(Body::new))
}

/// POST /files/write - Create or replace a file with text contents.
pub async fn write_file(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<WriteRequest>,
) -> Result<Json<ApiResponse<EntryResponse>>, ApiError> {
    let entry = state.files.write(&req.path, req.contents.as_bytes()).await?;
    Ok(Json(ApiResponse::new(EntryResponse::from(&entry))))
}

/// POST /files/mkdir - Create a directory and its parents.
pub async fn make_directory(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<MkdirRequest>,
) -> Result<Json<ApiResponse<EntryResponse>>, ApiError> {
    let entry = state.files.mkdir(&req.path).await?;
    Ok(Json(ApiResponse::new(EntryResponse::from(&entry))))
}

/// POST /files/upload - Upload files into a directory.
///
/// Request body: multipart/form-data with a `path` text field naming the
/// target directory and any number of file fields. Each file is stored under
/// the last component of its client file name.
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Vec<EntryResponse>>>, ApiError> {
    let mut target: Option<String> = None;
    let mut staged: Vec<IncomingFile> = Vec::new();

    if let Err(e) = receive_upload(&state.staging, &mut multipart, &mut target, &mut staged).await
    {
        state.staging.discard(&staged).await;
        return Err(e);
    }

    let target = target.unwrap_or_else(|| ".".to_string());
    let entries = match state.files.upload(&target, staged.clone()).await {
        Ok(entries) => entries,
        Err(e) => {
            state.staging.discard(&staged).await;
            return Err(e.into());
        }
    };

    Ok(Json(ApiResponse::new(
        entries.iter().map(EntryResponse::from).collect(),
    )))
}

/// Stream every file field into the staging area and pick up the target path.
///
/// Each staged file is pushed to `staged` before its bytes arrive so the
/// caller can discard partial uploads.
async fn receive_upload(
    staging: &UploadStaging,
    multipart: &mut Multipart,
    target: &mut Option<String>,
    staged: &mut Vec<IncomingFile>,
) -> Result<(), ApiError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let mut writer = staging.create(&file_name).await?;
                staged.push(writer.incoming().clone());
                while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                    writer.write_chunk(&chunk).await.map_err(|e| match e {
                        FiledeckError::Validation(message) => ApiError::payload_too_large(message),
                        other => other.into(),
                    })?;
                }
                writer.finish().await?;
            }
            None if field.name() == Some(UPLOAD_PATH_FIELD) => {
                *target = Some(field.text().await.map_err(multipart_error)?);
            }
            None => {}
        }
    }
    Ok(())
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(e.body_text())
    } else {
        tracing::warn!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    }
}

/// DELETE /files/rm - Remove a file or, with `recursive`, a directory tree.
pub async fn remove_path(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<RemoveQuery>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.files.remove(&query.path, query.recursive).await?;
    Ok(Json(ApiResponse::new(())))
}

/// POST /files/cp - Copy a file.
pub async fn copy_path(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<TransferRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.files.copy(&req.source, &req.destination).await?;
    Ok(Json(ApiResponse::new(())))
}

/// POST /files/mv - Move a file (copy, then unlink the source).
pub async fn move_path(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<TransferRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.files.move_file(&req.source, &req.destination).await?;
    Ok(Json(ApiResponse::new(())))
}
