//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Media error: {0}")]
    Media(#[from] vsprite_media::MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] vsprite_storage::StorageError),

    #[error("Database error: {0}")]
    Db(#[from] vsprite_db::DbError),

    #[error("Queue error: {0}")]
    Queue(#[from] vsprite_queue::QueueError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
