//! Video listing, status, and artifact delivery.
//!
//! Pure read path: nothing here mutates a record or an object. Artifact
//! reads are gated on the lifecycle status so a client polling during
//! processing gets a retryable "not ready" rather than a dangling 404.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use vsprite_models::{VideoId, VideoRecord, VideoStatus};
use vsprite_storage::{keys, StorageError};

use crate::error::{ApiError, ApiResult};
use crate::range::parse_range;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 500;

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct ListResponse {
    pub count: usize,
    pub videos: Vec<VideoRecord>,
}

/// GET /api/videos
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse>> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            s.parse::<VideoStatus>()
                .map_err(|e| ApiError::bad_request(e.to_string()))
        })
        .transpose()?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let videos = state.db.list(status, limit).await?;

    Ok(Json(ListResponse {
        count: videos.len(),
        videos,
    }))
}

/// GET /api/videos/:video_id/status
pub async fn get_video_status(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoRecord>> {
    let record = fetch_record(&state, &video_id).await?;
    Ok(Json(record))
}

/// GET /api/videos/:video_id/metadata
pub async fn get_video_metadata(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Response> {
    let record = fetch_record(&state, &video_id).await?;
    require_completed(&record)?;

    let key = keys::metadata_key(&record.id);
    let bytes = state.storage.get_bytes(&key).await.map_err(|e| match e {
        StorageError::NotFound(_) => ApiError::not_found("Metadata not found"),
        other => ApiError::Storage(other),
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(bytes))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

/// GET /api/videos/:video_id/sprite/:sprite_index
pub async fn get_sprite(
    State(state): State<AppState>,
    Path((video_id, sprite_index)): Path<(String, u32)>,
) -> ApiResult<Response> {
    let record = fetch_record(&state, &video_id).await?;
    require_completed(&record)?;

    // Single-sheet pipeline: index 0 is the only sheet that can exist
    if sprite_index != 0 {
        return Err(ApiError::not_found(format!(
            "Sprite {} does not exist",
            sprite_index
        )));
    }

    let key = keys::sprite_key(&record.id, sprite_index);
    let bytes = state.storage.get_bytes(&key).await.map_err(|e| match e {
        StorageError::NotFound(_) => ApiError::not_found("Sprite sheet not found"),
        other => ApiError::Storage(other),
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/jpeg")
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .body(Body::from(bytes))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

/// GET /api/videos/:video_id/stream
///
/// Serves the raw upload with byte-range support so players can seek.
/// Available as soon as the record exists; delivery does not wait for
/// the sprite pipeline.
pub async fn stream_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let record = fetch_record(&state, &video_id).await?;
    let key = &record.storage_key;

    let stat = state.storage.stat(key).await.map_err(|e| match e {
        StorageError::NotFound(_) => ApiError::not_found("Video file not found"),
        other => ApiError::Storage(other),
    })?;

    let content_type = stat
        .content_type
        .unwrap_or_else(|| record.mime_type.clone());

    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());

    let range = match range_header {
        Some(value) => parse_range(value, stat.size)
            .map_err(|_| ApiError::RangeNotSatisfiable { size: stat.size })?,
        None => None,
    };

    match range {
        Some(range) => {
            let bytes = state.storage.get_range(key, range.start, range.end).await?;

            Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, bytes.len())
                .header(header::CONTENT_RANGE, range.content_range(stat.size))
                .header(header::ACCEPT_RANGES, "bytes")
                .body(Body::from(bytes))
                .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
        }
        None => {
            // Full-file requests pass the object body through without
            // buffering it; uploads run to hundreds of megabytes.
            let stream = state.storage.get_stream(key).await?;
            let body = Body::from_stream(ReaderStream::new(stream.into_async_read()));

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, stat.size)
                .header(header::ACCEPT_RANGES, "bytes")
                .body(body)
                .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
        }
    }
}

async fn fetch_record(state: &AppState, video_id: &str) -> ApiResult<VideoRecord> {
    let id = VideoId::from_string(video_id);
    state
        .db
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Video {} not found", video_id)))
}

/// Gate artifact reads on the lifecycle status.
fn require_completed(record: &VideoRecord) -> ApiResult<()> {
    match record.status {
        VideoStatus::Completed => Ok(()),
        VideoStatus::Failed => Err(ApiError::ProcessingFailed(
            record
                .error_message
                .clone()
                .unwrap_or_else(|| "unknown error".to_string()),
        )),
        VideoStatus::Uploaded | VideoStatus::Processing => {
            Err(ApiError::NotReady(record.status))
        }
    }
}
