//! Sprite sheet tiling.

use std::path::Path;
use tracing::info;

use crate::command::{run_ffmpeg, FfmpegCommand};
use crate::error::{MediaError, MediaResult};
use crate::frames::list_frames;

/// Tile extracted frames into a single sprite sheet image.
///
/// Frames are read from `frames_dir` in index order, capped at
/// `max_frames`, and tiled into a `columns x rows` grid. Returns the
/// number of frames tiled; zero available frames is an error.
pub async fn build_sprite_sheet(
    frames_dir: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    columns: u32,
    rows: u32,
    max_frames: u32,
) -> MediaResult<usize> {
    let frames_dir = frames_dir.as_ref();
    let output_path = output_path.as_ref();

    let frames = list_frames(frames_dir).await?;
    if frames.is_empty() {
        return Err(MediaError::NoFrames);
    }

    let tiled = frames.len().min(max_frames as usize);

    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let pattern = frames_dir.join("frame_%04d.jpg");
    let cmd = FfmpegCommand::new(&pattern, output_path)
        .start_number(1)
        .frame_limit(tiled)
        .filter_complex(tile_filter(columns, rows));

    run_ffmpeg(&cmd).await?;

    info!(
        output = %output_path.display(),
        frame_count = tiled,
        grid = format!("{}x{}", columns, rows).as_str(),
        "Sprite sheet created"
    );

    Ok(tiled)
}

fn tile_filter(columns: u32, rows: u32) -> String {
    format!("tile={}x{}", columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_tile_filter() {
        assert_eq!(tile_filter(10, 10), "tile=10x10");
        assert_eq!(tile_filter(5, 4), "tile=5x4");
    }

    #[tokio::test]
    async fn test_zero_frames_is_an_error() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("sprite_0.jpg");

        let result = build_sprite_sheet(dir.path(), &out, 10, 10, 100).await;
        assert!(matches!(result, Err(MediaError::NoFrames)));
        assert!(!out.exists());
    }
}
