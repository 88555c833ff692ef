//! FFmpeg/FFprobe CLI wrappers.
//!
//! This crate provides:
//! - A command builder and runner for `ffmpeg`
//! - Duration probing via `ffprobe`
//! - Frame extraction at a fixed sampling interval and resolution
//! - Sprite sheet tiling via the `tile` filter

pub mod command;
pub mod error;
pub mod frames;
pub mod probe;
pub mod sprite;

pub use command::{FfmpegCommand, run_ffmpeg};
pub use error::{MediaError, MediaResult};
pub use frames::{extract_frames, list_frames};
pub use probe::probe_duration;
pub use sprite::build_sprite_sheet;
