//! API error types.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use vsprite_models::VideoStatus;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upload exceeds the size limit: {0}")]
    PayloadTooLarge(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Artifact requested before the pipeline finished; carries the
    /// current lifecycle status.
    #[error("Video is not ready (status: {0})")]
    NotReady(VideoStatus),

    #[error("Video processing failed: {0}")]
    ProcessingFailed(String),

    /// Requested range falls outside the object; carries the object size
    /// for the `Content-Range: bytes */size` response header.
    #[error("Requested range not satisfiable")]
    RangeNotSatisfiable { size: u64 },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(#[from] vsprite_storage::StorageError),

    #[error("Database error: {0}")]
    Db(#[from] vsprite_db::DbError),

    #[error("Queue error: {0}")]
    Queue(#[from] vsprite_queue::QueueError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            ApiError::ProcessingFailed(_)
            | ApiError::Internal(_)
            | ApiError::Storage(_)
            | ApiError::Db(_)
            | ApiError::Queue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let message = match &self {
            ApiError::Internal(_)
            | ApiError::Storage(_)
            | ApiError::Db(_)
            | ApiError::Queue(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let video_status = match &self {
            ApiError::NotReady(s) => Some(s.as_str().to_string()),
            _ => None,
        };

        let body = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message,
            status: video_status,
        };

        if let ApiError::RangeNotSatisfiable { size } = self {
            return (
                status,
                [(header::CONTENT_RANGE, format!("bytes */{}", size))],
                Json(body),
            )
                .into_response();
        }

        (status, Json(body)).into_response()
    }
}
