//! Multipart upload ingestion.
//!
//! Owns the store-then-record-then-enqueue transaction: the raw file is
//! written to object storage first, the record is inserted second, and
//! the task is published last. A failure at any later step compensates
//! the earlier writes so no orphaned state survives a rejected upload.

use std::path::PathBuf;

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use vsprite_models::{ProcessingTask, VideoId, VideoRecord};
use vsprite_storage::keys;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub video_id: VideoId,
    pub message: String,
    pub data: UploadData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadData {
    pub original_name: String,
    pub size: i64,
    pub uploaded_at: DateTime<Utc>,
}

struct StagedUpload {
    path: PathBuf,
    original_name: String,
    mime_type: String,
    size: i64,
}

/// POST /upload
pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let video_id = VideoId::new();

    let staged = stage_upload(&state, &video_id, multipart).await?;
    let result = ingest(&state, &video_id, &staged).await;

    // The staging file is spent whether ingestion succeeded or not
    remove_staging(&staged.path).await;

    let record = result?;

    info!(
        video_id = %video_id,
        original_name = %staged.original_name,
        size = staged.size,
        "Video uploaded and queued for processing"
    );

    Ok(Json(UploadResponse {
        success: true,
        video_id,
        message: "Video uploaded successfully and queued for processing".to_string(),
        data: UploadData {
            original_name: staged.original_name,
            size: staged.size,
            uploaded_at: record.created_at,
        },
    }))
}

/// Read the `video` multipart field into a staging file, validating MIME
/// type and size as the bytes arrive.
async fn stage_upload(
    state: &AppState,
    video_id: &VideoId,
    mut multipart: Multipart,
) -> ApiResult<StagedUpload> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("video") {
            continue;
        }

        let original_name = field
            .file_name()
            .map(|s| s.to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "video.mp4".to_string());

        let mime_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_default();
        if !state.config.is_allowed_mime(&mime_type) {
            return Err(ApiError::bad_request(format!(
                "Unsupported file type: {}",
                if mime_type.is_empty() { "unknown" } else { &mime_type }
            )));
        }

        let extension = keys::extension_of(&original_name);
        let staging_dir = PathBuf::from(&state.config.staging_dir);
        tokio::fs::create_dir_all(&staging_dir)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create staging dir: {}", e)))?;
        let path = staging_dir.join(format!("{}.{}", video_id, extension));

        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create staging file: {}", e)))?;

        let mut size: u64 = 0;
        let limit = state.config.max_upload_size as u64;

        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    remove_staging(&path).await;
                    return Err(ApiError::bad_request(format!("Upload aborted: {}", e)));
                }
            };

            size += chunk.len() as u64;
            if size > limit {
                remove_staging(&path).await;
                return Err(ApiError::PayloadTooLarge(format!(
                    "File exceeds the {} byte limit",
                    limit
                )));
            }

            if let Err(e) = file.write_all(&chunk).await {
                remove_staging(&path).await;
                return Err(ApiError::internal(format!(
                    "Failed to write staging file: {}",
                    e
                )));
            }
        }

        file.flush()
            .await
            .map_err(|e| ApiError::internal(format!("Failed to flush staging file: {}", e)))?;

        if size == 0 {
            remove_staging(&path).await;
            return Err(ApiError::bad_request("Uploaded file is empty"));
        }

        return Ok(StagedUpload {
            path,
            original_name,
            mime_type,
            size: size as i64,
        });
    }

    Err(ApiError::bad_request("Missing file field 'video'"))
}

/// Store, record, enqueue; compensate earlier writes on a later failure.
async fn ingest(
    state: &AppState,
    video_id: &VideoId,
    staged: &StagedUpload,
) -> ApiResult<VideoRecord> {
    let extension = keys::extension_of(&staged.original_name);
    let storage_key = keys::upload_key(video_id, &extension);

    state
        .storage
        .upload_file(&staged.path, &storage_key, &staged.mime_type)
        .await?;

    let record = VideoRecord::new(
        video_id.clone(),
        &staged.original_name,
        staged.size,
        &staged.mime_type,
        &storage_key,
    );

    if let Err(e) = state.db.insert(&record).await {
        error!(video_id = %video_id, "Record insert failed, rolling back object: {}", e);
        rollback_object(state, &storage_key).await;
        return Err(e.into());
    }

    let task = ProcessingTask::new(
        video_id.clone(),
        state.storage.bucket(),
        &storage_key,
        &staged.original_name,
        staged.size,
        &staged.mime_type,
    );

    if let Err(e) = state.queue.enqueue(&task).await {
        error!(
            video_id = %video_id,
            "Enqueue failed, rolling back record and object: {}", e
        );
        if let Err(db_err) = state.db.delete(video_id).await {
            warn!(video_id = %video_id, "Record rollback failed: {}", db_err);
        }
        rollback_object(state, &storage_key).await;
        return Err(e.into());
    }

    Ok(record)
}

async fn rollback_object(state: &AppState, key: &str) {
    if let Err(e) = state.storage.delete_object(key).await {
        warn!(key = %key, "Object rollback failed: {}", e);
    }
}

async fn remove_staging(path: &std::path::Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), "Failed to remove staging file: {}", e);
        }
    }
}
