//! End-to-end pipeline tests. Run against live MinIO + Postgres with
//! ffmpeg on PATH:
//! `cargo test -p vsprite-worker -- --ignored`

use std::sync::Arc;

use tempfile::TempDir;

use vsprite_db::{CompletionUpdate, VideoStore};
use vsprite_models::{ProcessingTask, SpriteLayout, VideoId, VideoRecord, VideoStatus};
use vsprite_storage::{keys, ObjectStore};
use vsprite_worker::{process_task, ProcessingContext};

async fn context(work_dir: &TempDir) -> ProcessingContext {
    dotenvy::dotenv().ok();

    let db = VideoStore::from_env().await.expect("Failed to connect");
    db.run_migrations().await.expect("Failed to migrate");

    ProcessingContext {
        storage: Arc::new(ObjectStore::from_env().expect("Failed to create client")),
        db: Arc::new(db),
        layout: SpriteLayout::default(),
        work_dir: work_dir.path().to_path_buf(),
    }
}

/// Synthesize a 20-second test video with ffmpeg's test source.
async fn make_test_video(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("source.mp4");
    let status = tokio::process::Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-f", "lavfi", "-i", "testsrc=duration=20:size=320x240:rate=10"])
        .arg(&path)
        .status()
        .await
        .expect("Failed to run ffmpeg");
    assert!(status.success(), "ffmpeg test source generation failed");
    path
}

async fn seed(ctx: &ProcessingContext, id: &VideoId, bytes: Vec<u8>) -> ProcessingTask {
    let key = keys::upload_key(id, "mp4");
    let size = bytes.len() as i64;

    ctx.storage
        .upload_bytes(bytes, &key, "video/mp4")
        .await
        .expect("upload failed");

    let record = VideoRecord::new(id.clone(), "source.mp4", size, "video/mp4", &key);
    ctx.db.insert(&record).await.expect("insert failed");

    ProcessingTask::new(id.clone(), "videos", &key, "source.mp4", size, "video/mp4")
}

#[tokio::test]
#[ignore = "requires MinIO, Postgres, and ffmpeg"]
async fn test_happy_path_twenty_second_video() {
    let work_dir = TempDir::new().unwrap();
    let ctx = context(&work_dir).await;

    let video = make_test_video(&work_dir).await;
    let bytes = tokio::fs::read(&video).await.unwrap();

    let id = VideoId::new();
    let task = seed(&ctx, &id, bytes).await;

    process_task(&ctx, &task).await.expect("pipeline failed");

    let record = ctx.db.get(&id).await.unwrap().expect("record missing");
    assert_eq!(record.status, VideoStatus::Completed);
    // 20s at a 2s interval
    assert_eq!(record.thumbnail_count, Some(10));
    assert!(record.video_duration.unwrap() > 19.0);

    // Both artifacts published under deterministic keys
    let metadata_bytes = ctx
        .storage
        .get_bytes(&keys::metadata_key(&id))
        .await
        .expect("metadata missing");
    let metadata: serde_json::Value = serde_json::from_slice(&metadata_bytes).unwrap();
    assert_eq!(metadata["totalThumbnails"], 10);
    assert_eq!(metadata["spriteWidth"], 1600);
    assert!(ctx
        .storage
        .exists(&keys::sprite_key(&id, 0))
        .await
        .expect("exists failed"));

    // Working directories removed on success
    assert!(!work_dir.path().join("frames").join(id.as_str()).exists());

    ctx.db.delete(&id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires MinIO, Postgres, and ffmpeg"]
async fn test_corrupt_input_marks_failed() {
    let work_dir = TempDir::new().unwrap();
    let ctx = context(&work_dir).await;

    let id = VideoId::new();
    let task = seed(&ctx, &id, b"this is not a video".to_vec()).await;

    process_task(&ctx, &task)
        .await
        .expect_err("pipeline should fail on garbage input");

    let record = ctx.db.get(&id).await.unwrap().expect("record missing");
    assert_eq!(record.status, VideoStatus::Failed);
    assert!(record.error_message.is_some());

    // No artifacts for a failed video
    assert!(!ctx
        .storage
        .exists(&keys::sprite_key(&id, 0))
        .await
        .expect("exists failed"));

    ctx.db.delete(&id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires MinIO, Postgres, and ffmpeg"]
async fn test_failed_record_is_retried_on_redelivery() {
    let work_dir = TempDir::new().unwrap();
    let ctx = context(&work_dir).await;

    let id = VideoId::new();
    let task = seed(&ctx, &id, b"garbage".to_vec()).await;

    process_task(&ctx, &task).await.expect_err("should fail");

    // Redelivery must re-run the pipeline, not skip-and-ack, or the
    // bounded-retry path could never fire for deterministic failures.
    process_task(&ctx, &task)
        .await
        .expect_err("redelivery must retry a failed record");

    let record = ctx.db.get(&id).await.unwrap().expect("record missing");
    assert_eq!(record.status, VideoStatus::Failed);
    assert!(record.error_message.is_some());

    ctx.db.delete(&id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires MinIO, Postgres, and ffmpeg"]
async fn test_completed_record_skips_reprocessing() {
    let work_dir = TempDir::new().unwrap();
    let ctx = context(&work_dir).await;

    let id = VideoId::new();
    // The object key points at garbage, so any actual pipeline run would fail
    let task = seed(&ctx, &id, b"garbage".to_vec()).await;

    ctx.db.mark_processing(&id).await.unwrap();
    ctx.db
        .mark_completed(
            &id,
            &CompletionUpdate {
                thumbnail_count: 10,
                video_duration: 20.0,
                sprite_sheet_path: keys::sprite_key(&id, 0),
                metadata_path: keys::metadata_key(&id),
            },
        )
        .await
        .unwrap();

    // Redelivery of finished work is a clean no-op
    process_task(&ctx, &task)
        .await
        .expect("redelivery against a completed record must ack cleanly");

    let record = ctx.db.get(&id).await.unwrap().expect("record missing");
    assert_eq!(record.status, VideoStatus::Completed);

    ctx.db.delete(&id).await.unwrap();
}
