//! Frame extraction at a fixed sampling interval.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::command::{run_ffmpeg, FfmpegCommand};
use crate::error::{MediaError, MediaResult};

/// Extract thumbnail frames from `video_path` into `frames_dir`.
///
/// One frame is sampled every `interval_secs` seconds, scaled to
/// `width x height`, and written as `frame_0001.jpg`, `frame_0002.jpg`, ...
/// Returns the number of frames produced; zero frames is an error.
pub async fn extract_frames(
    video_path: impl AsRef<Path>,
    frames_dir: impl AsRef<Path>,
    interval_secs: u32,
    width: u32,
    height: u32,
) -> MediaResult<usize> {
    let video_path = video_path.as_ref();
    let frames_dir = frames_dir.as_ref();

    if !video_path.exists() {
        return Err(MediaError::FileNotFound(video_path.to_path_buf()));
    }
    tokio::fs::create_dir_all(frames_dir).await?;

    let pattern = frames_dir.join("frame_%04d.jpg");
    let cmd = FfmpegCommand::new(video_path, &pattern)
        .video_filter(extraction_filter(interval_secs, width, height))
        .quality(2);

    run_ffmpeg(&cmd).await?;

    let frames = list_frames(frames_dir).await?;
    if frames.is_empty() {
        return Err(MediaError::NoFrames);
    }

    info!(
        count = frames.len(),
        dir = %frames_dir.display(),
        "Frames extracted"
    );

    Ok(frames.len())
}

fn extraction_filter(interval_secs: u32, width: u32, height: u32) -> String {
    format!("fps=1/{},scale={}:{}", interval_secs.max(1), width, height)
}

/// List extracted `.jpg` frames in a directory, sorted by name.
/// The `frame_%04d` naming makes lexicographic order equal frame order.
pub async fn list_frames(frames_dir: impl AsRef<Path>) -> MediaResult<Vec<PathBuf>> {
    let mut frames = Vec::new();
    let mut entries = tokio::fs::read_dir(frames_dir.as_ref()).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("jpg") {
            frames.push(path);
        }
    }

    frames.sort();
    Ok(frames)
}
