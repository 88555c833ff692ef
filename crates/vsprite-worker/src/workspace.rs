//! Per-task working directories.

use std::path::{Path, PathBuf};
use tracing::warn;

use vsprite_models::VideoId;

use crate::error::WorkerResult;

/// Local filesystem scope of one task.
///
/// All three directories are keyed by the video identifier, so a
/// redelivered task recreates and overwrites its own state and two tasks
/// never share paths.
#[derive(Debug, Clone)]
pub struct TaskWorkspace {
    /// Directory holding the downloaded source file
    pub download_dir: PathBuf,
    /// Downloaded source video
    pub video_path: PathBuf,
    /// Extracted frame images
    pub frames_dir: PathBuf,
    /// Sprite sheet output
    pub sprite_dir: PathBuf,
}

impl TaskWorkspace {
    /// Create the working directories for a task.
    pub async fn create(
        work_dir: impl AsRef<Path>,
        video_id: &VideoId,
        extension: &str,
    ) -> WorkerResult<Self> {
        let work_dir = work_dir.as_ref();

        let download_dir = work_dir.join("downloads").join(video_id.as_str());
        let frames_dir = work_dir.join("frames").join(video_id.as_str());
        let sprite_dir = work_dir.join("sprites").join(video_id.as_str());

        for dir in [&download_dir, &frames_dir, &sprite_dir] {
            tokio::fs::create_dir_all(dir).await?;
        }

        let video_path = download_dir.join(format!("{}.{}", video_id, extension));

        Ok(Self {
            download_dir,
            video_path,
            frames_dir,
            sprite_dir,
        })
    }

    /// Remove all working directories. Best effort: failures are logged,
    /// never raised, so cleanup cannot mask a pipeline error.
    pub async fn cleanup(&self) {
        for dir in [&self.download_dir, &self.frames_dir, &self.sprite_dir] {
            if let Err(e) = tokio::fs::remove_dir_all(dir).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(dir = %dir.display(), "Failed to remove working directory: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_and_cleanup() {
        let root = TempDir::new().unwrap();
        let id = VideoId::from_string("v1");

        let ws = TaskWorkspace::create(root.path(), &id, "mp4").await.unwrap();
        assert!(ws.download_dir.is_dir());
        assert!(ws.frames_dir.is_dir());
        assert!(ws.sprite_dir.is_dir());
        assert_eq!(ws.video_path, ws.download_dir.join("v1.mp4"));

        tokio::fs::write(&ws.video_path, b"data").await.unwrap();
        tokio::fs::write(ws.frames_dir.join("frame_0001.jpg"), b"jpg")
            .await
            .unwrap();

        ws.cleanup().await;
        assert!(!ws.download_dir.exists());
        assert!(!ws.frames_dir.exists());
        assert!(!ws.sprite_dir.exists());
    }

    #[tokio::test]
    async fn test_paths_scoped_per_video() {
        let root = TempDir::new().unwrap();
        let a = TaskWorkspace::create(root.path(), &VideoId::from_string("a"), "mp4")
            .await
            .unwrap();
        let b = TaskWorkspace::create(root.path(), &VideoId::from_string("b"), "mp4")
            .await
            .unwrap();

        assert_ne!(a.frames_dir, b.frames_dir);
        assert_ne!(a.video_path, b.video_path);
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let root = TempDir::new().unwrap();
        let ws = TaskWorkspace::create(root.path(), &VideoId::from_string("v1"), "mp4")
            .await
            .unwrap();

        ws.cleanup().await;
        // Second cleanup of missing directories must not panic or log errors
        ws.cleanup().await;
    }
}
