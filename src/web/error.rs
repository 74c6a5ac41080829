//! API error handling for the Filedeck HTTP API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashMap;
use std::io;

use crate::FiledeckError;

/// Machine-readable error codes, one per HTTP status the API returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    Forbidden,
    NotFound,
    Conflict,
    PayloadTooLarge,
    /// Field-level validation errors (422).
    ValidationError,
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body of every error response: `{"error": {code, message, details?}}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
    /// Messages per invalid field, for validation errors only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Vec<String>>>,
}

/// Error returned by handlers; renders as an [`ErrorBody`] with the status of
/// its [`ErrorCode`].
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    details: Option<HashMap<String, Vec<String>>>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PayloadTooLarge, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Field-level validation failure.
    pub fn validation(details: HashMap<String, Vec<String>>) -> Self {
        Self {
            details: Some(details),
            ..Self::new(ErrorCode::ValidationError, "Validation failed")
        }
    }

    /// Collect `validator` failures into per-field messages.
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .into_iter()
            .map(|(field, failures)| {
                let messages = failures
                    .iter()
                    .map(|failure| match &failure.message {
                        Some(message) => message.to_string(),
                        None => format!("Invalid value for {field}"),
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        Self::validation(details)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };
        (self.code.status_code(), Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code.status_code().as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<FiledeckError> for ApiError {
    fn from(err: FiledeckError) -> Self {
        let message = err.to_string();
        match &err {
            FiledeckError::NotFound(_) => ApiError::not_found(message),
            FiledeckError::AccessDenied(_) => ApiError::forbidden(message),
            FiledeckError::NotADirectory(_)
            | FiledeckError::IsADirectory(_)
            | FiledeckError::Validation(_) => ApiError::bad_request(message),
            FiledeckError::DirectoryNotEmpty(_) | FiledeckError::AlreadyExists(_) => {
                ApiError::conflict(message)
            }
            FiledeckError::CopyFailure { cause, .. } => match cause.kind() {
                io::ErrorKind::NotFound => ApiError::not_found(message),
                io::ErrorKind::PermissionDenied => ApiError::forbidden(message),
                io::ErrorKind::IsADirectory | io::ErrorKind::NotADirectory => {
                    ApiError::bad_request(message)
                }
                _ => {
                    tracing::error!("Copy failed: {}", message);
                    ApiError::internal(message)
                }
            },
            FiledeckError::Aggregate(_) => {
                tracing::error!("{}", message);
                ApiError::internal(message)
            }
            _ => {
                tracing::error!("Internal error: {}", message);
                ApiError::internal("An internal error occurred")
            }
        }
    }
}
