//! Shared data models for the vsprite backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video records and the lifecycle status machine
//! - Processing task messages carried by the queue
//! - Sprite sheet metadata documents and grid layout math

pub mod sprite;
pub mod task;
pub mod video;

// Re-export common types
pub use sprite::{SpriteLayout, SpriteMetadata, SpriteSheetEntry, ThumbnailCell};
pub use task::ProcessingTask;
pub use video::{InvalidStatus, VideoId, VideoRecord, VideoStatus};
