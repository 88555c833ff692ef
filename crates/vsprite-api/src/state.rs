//! Application state.

use std::sync::Arc;

use vsprite_db::VideoStore;
use vsprite_queue::TaskQueue;
use vsprite_storage::ObjectStore;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub storage: Arc<ObjectStore>,
    pub db: Arc<VideoStore>,
    pub queue: Arc<TaskQueue>,
}

impl AppState {
    /// Create new application state, apply pending migrations, and make
    /// sure the task stream's consumer group exists. Creating the group
    /// here means tasks enqueued before any worker has ever started are
    /// delivered once one does.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let storage = ObjectStore::from_env()?;
        let db = VideoStore::from_env().await?;
        db.run_migrations().await?;
        let queue = TaskQueue::from_env()?;
        queue.init().await?;

        Ok(Self {
            config,
            storage: Arc::new(storage),
            db: Arc::new(db),
            queue: Arc::new(queue),
        })
    }
}
