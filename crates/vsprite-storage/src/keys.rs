//! Object store key layout.
//!
//! Every key is deterministic in the video ID so that a redelivered task
//! overwrites its own artifacts instead of accumulating new ones.

use std::path::Path;

use vsprite_models::VideoId;

/// Key of the raw upload: `uploads/{videoId}.{ext}`.
pub fn upload_key(video_id: &VideoId, extension: &str) -> String {
    format!("uploads/{}.{}", video_id, extension)
}

/// Key of a sprite sheet: `sprites/{videoId}/sprite_{index}.jpg`.
pub fn sprite_key(video_id: &VideoId, index: u32) -> String {
    format!("sprites/{}/sprite_{}.jpg", video_id, index)
}

/// Key of the metadata document: `metadata/{videoId}/metadata.json`.
pub fn metadata_key(video_id: &VideoId) -> String {
    format!("metadata/{}/metadata.json", video_id)
}

/// File extension of an original filename, lowercased, defaulting to `mp4`.
pub fn extension_of(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "mp4".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let id = VideoId::from_string("v1");
        assert_eq!(upload_key(&id, "mp4"), "uploads/v1.mp4");
        assert_eq!(sprite_key(&id, 0), "sprites/v1/sprite_0.jpg");
        assert_eq!(metadata_key(&id), "metadata/v1/metadata.json");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("clip.MP4"), "mp4");
        assert_eq!(extension_of("movie.mkv"), "mkv");
        assert_eq!(extension_of("noext"), "mp4");
        assert_eq!(extension_of("trailing."), "mp4");
    }
}
