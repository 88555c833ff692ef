//! The processing pipeline: one task in, one terminal status out.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};

use vsprite_db::{CompletionUpdate, VideoStore};
use vsprite_media::{build_sprite_sheet, extract_frames, probe_duration};
use vsprite_models::{ProcessingTask, SpriteLayout};
use vsprite_storage::{keys, ObjectStore};

use crate::error::WorkerResult;
use crate::workspace::TaskWorkspace;

/// Shared clients and parameters for pipeline runs.
pub struct ProcessingContext {
    pub storage: Arc<ObjectStore>,
    pub db: Arc<VideoStore>,
    pub layout: SpriteLayout,
    pub work_dir: PathBuf,
}

/// Run the full pipeline for one task.
///
/// On success the record ends `completed` with published artifacts; on any
/// step failure the record is marked `failed` with the captured message
/// (best effort) and the error propagates to the consumption loop, which
/// decides the queue disposition. The pipeline is safe to re-run from
/// scratch for the same video: local state and object keys are
/// deterministic in the video identifier.
pub async fn process_task(ctx: &ProcessingContext, task: &ProcessingTask) -> WorkerResult<()> {
    info!(
        video_id = %task.video_id,
        key = %task.key,
        original_name = %task.original_name,
        "Starting video processing"
    );

    // Step 1: claim the record. Only a completed record refuses the
    // claim (redelivery of finished work); a failed record is a retry
    // and runs the pipeline again.
    if !ctx.db.mark_processing(&task.video_id).await? {
        info!(video_id = %task.video_id, "Record already completed, skipping");
        return Ok(());
    }

    let result = run_steps(ctx, task).await;

    if let Err(e) = &result {
        error!(video_id = %task.video_id, "Video processing failed: {}", e);

        // Record the failure; a secondary failure here must not mask the
        // pipeline error.
        if let Err(db_err) = ctx.db.mark_failed(&task.video_id, &e.to_string()).await {
            error!(
                video_id = %task.video_id,
                "Failed to record failure status: {}", db_err
            );
        }
    }

    result
}

async fn run_steps(ctx: &ProcessingContext, task: &ProcessingTask) -> WorkerResult<()> {
    // Step 2: isolated working directories scoped to this video
    let extension = keys::extension_of(&task.original_name);
    let workspace = TaskWorkspace::create(&ctx.work_dir, &task.video_id, &extension).await?;

    let result = run_media_steps(ctx, task, &workspace).await;

    // Step 11: local state goes away on success and failure alike
    workspace.cleanup().await;

    result
}

async fn run_media_steps(
    ctx: &ProcessingContext,
    task: &ProcessingTask,
    workspace: &TaskWorkspace,
) -> WorkerResult<()> {
    let layout = &ctx.layout;

    // Step 3: download the raw video
    let downloaded = ctx
        .storage
        .download_file(&task.key, &workspace.video_path)
        .await?;
    info!(
        video_id = %task.video_id,
        size = downloaded,
        "Video downloaded"
    );

    // Step 4: probe duration
    let duration = probe_duration(&workspace.video_path).await?;

    // Step 5: extract frames at the sampling interval
    let frames_extracted = extract_frames(
        &workspace.video_path,
        &workspace.frames_dir,
        layout.thumbnail_interval,
        layout.thumbnail_width,
        layout.thumbnail_height,
    )
    .await?;
    info!(
        video_id = %task.video_id,
        count = frames_extracted,
        "Frames extracted"
    );

    // Step 6: cap and tile into the single sheet
    let sprite_local = workspace.sprite_dir.join("sprite_0.jpg");
    let thumbnail_count = build_sprite_sheet(
        &workspace.frames_dir,
        &sprite_local,
        layout.columns,
        layout.rows,
        layout.max_frames,
    )
    .await?;

    // Step 7: publish the sprite sheet
    let sprite_key = keys::sprite_key(&task.video_id, 0);
    ctx.storage
        .upload_file(&sprite_local, &sprite_key, "image/jpeg")
        .await?;

    // Steps 8-9: build and publish the metadata document
    let metadata = layout.build_metadata(&task.video_id, duration, thumbnail_count as u32);
    let metadata_key = keys::metadata_key(&task.video_id);
    ctx.storage
        .upload_bytes(
            serde_json::to_vec(&metadata)?,
            &metadata_key,
            "application/json",
        )
        .await?;

    // Step 10: terminal status with derived attributes
    ctx.db
        .mark_completed(
            &task.video_id,
            &CompletionUpdate {
                thumbnail_count: thumbnail_count as i32,
                video_duration: duration,
                sprite_sheet_path: sprite_key,
                metadata_path: metadata_key,
            },
        )
        .await?;

    info!(
        video_id = %task.video_id,
        thumbnail_count,
        duration = format!("{:.2}", duration).as_str(),
        "Video processing completed"
    );

    Ok(())
}
