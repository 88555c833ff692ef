//! Video record models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for an uploaded video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Error for an unrecognized status string.
#[derive(Debug, thiserror::Error)]
#[error("invalid video status: {0}")]
pub struct InvalidStatus(pub String);

/// Video lifecycle status.
///
/// `uploaded -> processing -> {completed, failed}`. `completed` is
/// sticky; a `failed` record is claimed again when the broker redelivers
/// its task, until the attempt cap dead-letters the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Raw file stored, record created, task enqueued
    #[default]
    Uploaded,
    /// A worker picked the task up
    Processing,
    /// Sprite sheet and metadata published
    Completed,
    /// Pipeline raised; `error_message` carries the cause
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Uploaded => "uploaded",
            VideoStatus::Processing => "processing",
            VideoStatus::Completed => "completed",
            VideoStatus::Failed => "failed",
        }
    }

    /// Whether the pipeline reached an end state for this record.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Completed | VideoStatus::Failed)
    }

    /// Check a proposed transition against the lifecycle machine.
    pub fn can_transition_to(&self, next: VideoStatus) -> bool {
        match (self, next) {
            (VideoStatus::Uploaded, VideoStatus::Processing) => true,
            (VideoStatus::Processing, VideoStatus::Completed) => true,
            (VideoStatus::Processing, VideoStatus::Failed) => true,
            // Redelivery re-runs the pipeline on a record already marked processing
            (VideoStatus::Processing, VideoStatus::Processing) => true,
            // Redelivery retries a failed record until the broker gives up
            (VideoStatus::Failed, VideoStatus::Processing) => true,
            _ => false,
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VideoStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(VideoStatus::Uploaded),
            "processing" => Ok(VideoStatus::Processing),
            "completed" => Ok(VideoStatus::Completed),
            "failed" => Ok(VideoStatus::Failed),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

/// One row of the video record store.
///
/// `video_duration`, `thumbnail_count`, `sprite_sheet_path` and
/// `metadata_path` are set only on the transition to `completed`;
/// `error_message` only on the transition to `failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    #[serde(rename = "videoId")]
    pub id: VideoId,
    pub original_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub storage_key: String,
    pub status: VideoStatus,
    pub video_duration: Option<f64>,
    pub thumbnail_count: Option<i32>,
    pub sprite_sheet_path: Option<String>,
    pub metadata_path: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Build a fresh record in the `uploaded` state.
    pub fn new(
        id: VideoId,
        original_name: impl Into<String>,
        file_size: i64,
        mime_type: impl Into<String>,
        storage_key: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            original_name: original_name.into(),
            file_size,
            mime_type: mime_type.into(),
            storage_key: storage_key.into(),
            status: VideoStatus::Uploaded,
            video_duration: None,
            thumbnail_count: None,
            sprite_sheet_path: None,
            metadata_path: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            VideoStatus::Uploaded,
            VideoStatus::Processing,
            VideoStatus::Completed,
            VideoStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<VideoStatus>().unwrap(), status);
        }
        assert!("bogus".parse::<VideoStatus>().is_err());
    }

    #[test]
    fn test_transitions_are_monotonic() {
        use VideoStatus::*;

        assert!(Uploaded.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Processing));

        // Completed is sticky
        assert!(Completed.is_terminal());
        for next in [Uploaded, Processing, Completed, Failed] {
            assert!(!Completed.can_transition_to(next));
        }

        // No skipping straight to an end state
        assert!(!Uploaded.can_transition_to(Completed));
        assert!(!Uploaded.can_transition_to(Failed));
    }

    #[test]
    fn test_failed_record_can_be_retried() {
        use VideoStatus::*;

        // A redelivered task re-claims a failed record for another attempt
        assert!(Failed.is_terminal());
        assert!(Failed.can_transition_to(Processing));

        // Nowhere else, though
        assert!(!Failed.can_transition_to(Uploaded));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Failed.can_transition_to(Failed));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = VideoRecord::new(
            VideoId::from_string("v1"),
            "clip.mp4",
            1024,
            "video/mp4",
            "uploads/v1.mp4",
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["videoId"], "v1");
        assert_eq!(json["originalName"], "clip.mp4");
        assert_eq!(json["status"], "uploaded");
        assert!(json["errorMessage"].is_null());
    }
}
