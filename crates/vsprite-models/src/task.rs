//! Processing task message carried by the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::video::VideoId;

/// Immutable description of one processing task.
///
/// Produced once per successful ingestion and delivered at least once;
/// everything a worker needs to re-run the pipeline from scratch is in
/// the message itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingTask {
    pub video_id: VideoId,
    /// Object store bucket holding the raw upload
    pub bucket: String,
    /// Object store key of the raw upload
    pub key: String,
    pub original_name: String,
    pub file_size: i64,
    pub mime_type: String,
    /// When the task was enqueued
    pub timestamp: DateTime<Utc>,
}

impl ProcessingTask {
    pub fn new(
        video_id: VideoId,
        bucket: impl Into<String>,
        key: impl Into<String>,
        original_name: impl Into<String>,
        file_size: i64,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            video_id,
            bucket: bucket.into(),
            key: key.into(),
            original_name: original_name.into(),
            file_size,
            mime_type: mime_type.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_wire_shape() {
        let task = ProcessingTask::new(
            VideoId::from_string("v1"),
            "videos",
            "uploads/v1.mp4",
            "clip.mp4",
            2048,
            "video/mp4",
        );

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["videoId"], "v1");
        assert_eq!(json["bucket"], "videos");
        assert_eq!(json["key"], "uploads/v1.mp4");
        assert_eq!(json["originalName"], "clip.mp4");
        assert_eq!(json["fileSize"], 2048);
        assert_eq!(json["mimeType"], "video/mp4");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_task_roundtrip() {
        let task = ProcessingTask::new(
            VideoId::new(),
            "videos",
            "uploads/x.mkv",
            "x.mkv",
            1,
            "video/x-matroska",
        );

        let parsed: ProcessingTask =
            serde_json::from_str(&serde_json::to_string(&task).unwrap()).unwrap();
        assert_eq!(parsed.video_id, task.video_id);
        assert_eq!(parsed.key, task.key);
        assert_eq!(parsed.timestamp, task.timestamp);
    }
}
