//! Worker configuration.

use std::time::Duration;

use vsprite_models::SpriteLayout;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Outstanding deliveries per worker instance. The pipeline's
    /// re-entrancy guarantees assume 1; `validate` enforces it.
    pub concurrency: usize,
    /// Root directory for per-task working directories
    pub work_dir: String,
    /// How long one consume call blocks waiting for a delivery
    pub consume_block: Duration,
    /// How often to sweep for pending deliveries from crashed workers
    pub claim_interval: Duration,
    /// Sprite grid parameters
    pub layout: SpriteLayout,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            work_dir: "/tmp/vsprite".to_string(),
            consume_block: Duration::from_secs(1),
            claim_interval: Duration::from_secs(30),
            layout: SpriteLayout::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = SpriteLayout::default();

        Self {
            concurrency: env_parse("WORKER_CONCURRENCY", 1),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .unwrap_or_else(|_| "/tmp/vsprite".to_string()),
            consume_block: Duration::from_millis(env_parse("WORKER_CONSUME_BLOCK_MS", 1000)),
            claim_interval: Duration::from_secs(env_parse("WORKER_CLAIM_INTERVAL_SECS", 30)),
            layout: SpriteLayout {
                thumbnail_interval: env_parse(
                    "THUMBNAIL_INTERVAL_SECS",
                    defaults.thumbnail_interval,
                ),
                thumbnail_width: env_parse("THUMBNAIL_WIDTH", defaults.thumbnail_width),
                thumbnail_height: env_parse("THUMBNAIL_HEIGHT", defaults.thumbnail_height),
                columns: env_parse("SPRITE_COLUMNS", defaults.columns),
                rows: env_parse("SPRITE_ROWS", defaults.rows),
                max_frames: env_parse("MAX_FRAMES_PER_SPRITE", defaults.max_frames),
            },
        }
    }

    /// Validate startup invariants.
    ///
    /// Concurrency above 1 would silently change the single-outstanding-
    /// delivery contract the pipeline depends on, so it is rejected rather
    /// than honored.
    pub fn validate(&self) -> WorkerResult<()> {
        if self.concurrency != 1 {
            return Err(WorkerError::invalid_config(format!(
                "WORKER_CONCURRENCY must be 1 (got {}); scale with more worker processes",
                self.concurrency
            )));
        }
        if self.layout.columns == 0 || self.layout.rows == 0 {
            return Err(WorkerError::invalid_config(
                "sprite grid dimensions must be non-zero",
            ));
        }
        if self.layout.max_frames == 0
            || self.layout.max_frames > self.layout.columns * self.layout.rows
        {
            return Err(WorkerError::invalid_config(format!(
                "MAX_FRAMES_PER_SPRITE must be within 1..={} for a {}x{} grid",
                self.layout.columns * self.layout.rows,
                self.layout.columns,
                self.layout.rows
            )));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
