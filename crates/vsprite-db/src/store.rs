//! Video record store operations.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};

use vsprite_models::{VideoId, VideoRecord, VideoStatus};

use crate::error::{DbError, DbResult};

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Postgres connection URL
    pub url: String,
    /// Pool size
    pub max_connections: u32,
}

impl DbConfig {
    /// Create config from environment variables.
    pub fn from_env() -> DbResult<Self> {
        Ok(Self {
            url: std::env::var("DATABASE_URL").map_err(|_| {
                DbError::Sqlx(sqlx::Error::Configuration("DATABASE_URL not set".into()))
            })?,
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        })
    }
}

/// Attributes written on the transition to `completed`.
#[derive(Debug, Clone)]
pub struct CompletionUpdate {
    pub thumbnail_count: i32,
    pub video_duration: f64,
    pub sprite_sheet_path: String,
    pub metadata_path: String,
}

#[derive(Debug, FromRow)]
struct VideoRow {
    id: String,
    original_name: String,
    file_size: i64,
    mime_type: String,
    storage_key: String,
    status: String,
    video_duration: Option<f64>,
    thumbnail_count: Option<i32>,
    sprite_sheet_path: Option<String>,
    metadata_path: Option<String>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VideoRow {
    fn into_record(self) -> DbResult<VideoRecord> {
        let status = self
            .status
            .parse::<VideoStatus>()
            .map_err(|e| DbError::corrupt(&self.id, e.to_string()))?;

        Ok(VideoRecord {
            id: VideoId::from_string(self.id),
            original_name: self.original_name,
            file_size: self.file_size,
            mime_type: self.mime_type,
            storage_key: self.storage_key,
            status,
            video_duration: self.video_duration,
            thumbnail_count: self.thumbnail_count,
            sprite_sheet_path: self.sprite_sheet_path,
            metadata_path: self.metadata_path,
            error_message: self.error_message,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, original_name, file_size, mime_type, storage_key, status, \
     video_duration, thumbnail_count, sprite_sheet_path, metadata_path, \
     error_message, created_at, updated_at";

/// Pooled Postgres-backed video record store.
#[derive(Clone)]
pub struct VideoStore {
    pool: PgPool,
}

impl VideoStore {
    /// Connect a pool.
    pub async fn connect(config: &DbConfig) -> DbResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// Connect from environment variables.
    pub async fn from_env() -> DbResult<Self> {
        Self::connect(&DbConfig::from_env()?).await
    }

    /// Run embedded migrations.
    pub async fn run_migrations(&self) -> DbResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Round-trip the pool for readiness checks.
    pub async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Insert a fresh record in the `uploaded` state.
    pub async fn insert(&self, record: &VideoRecord) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO videos (id, original_name, file_size, mime_type, storage_key, status) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id.as_str())
        .bind(&record.original_name)
        .bind(record.file_size)
        .bind(&record.mime_type)
        .bind(&record.storage_key)
        .bind(record.status.as_str())
        .execute(&self.pool)
        .await?;

        info!(video_id = %record.id, "Video record created");
        Ok(())
    }

    /// Fetch one record.
    pub async fn get(&self, id: &VideoId) -> DbResult<Option<VideoRecord>> {
        let row: Option<VideoRow> = sqlx::query_as(&format!(
            "SELECT {} FROM videos WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(VideoRow::into_record).transpose()
    }

    /// List records, newest first, optionally filtered by status.
    pub async fn list(
        &self,
        status: Option<VideoStatus>,
        limit: i64,
    ) -> DbResult<Vec<VideoRecord>> {
        let rows: Vec<VideoRow> = match status {
            Some(status) => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM videos WHERE status = $1 \
                     ORDER BY created_at DESC LIMIT $2",
                    SELECT_COLUMNS
                ))
                .bind(status.as_str())
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM videos ORDER BY created_at DESC LIMIT $1",
                    SELECT_COLUMNS
                ))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(VideoRow::into_record).collect()
    }

    /// Delete a record (ingestion compensation). Returns whether a row existed.
    pub async fn delete(&self, id: &VideoId) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a record `processing`.
    ///
    /// Returns `true` when the record is now in `processing`; `false` when
    /// the record is already `completed` (redelivered task for finished
    /// work). A `failed` record is claimed again: the broker keeps
    /// redelivering its task until the attempt cap dead-letters it. Errors
    /// when the record does not exist.
    pub async fn mark_processing(&self, id: &VideoId) -> DbResult<bool> {
        let applied = sqlx::query(
            "UPDATE videos SET status = 'processing', updated_at = NOW() \
             WHERE id = $1 AND status <> 'completed'",
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected()
            > 0;

        if applied {
            info!(video_id = %id, "Video status updated to processing");
            return Ok(true);
        }

        self.explain_unapplied(id).await
    }

    /// Mark a record `completed` with its derived attributes.
    pub async fn mark_completed(&self, id: &VideoId, update: &CompletionUpdate) -> DbResult<bool> {
        let applied = sqlx::query(
            "UPDATE videos SET status = 'completed', thumbnail_count = $2, \
             video_duration = $3, sprite_sheet_path = $4, metadata_path = $5, \
             updated_at = NOW() \
             WHERE id = $1 AND status <> 'completed'",
        )
        .bind(id.as_str())
        .bind(update.thumbnail_count)
        .bind(update.video_duration)
        .bind(&update.sprite_sheet_path)
        .bind(&update.metadata_path)
        .execute(&self.pool)
        .await?
        .rows_affected()
            > 0;

        if applied {
            info!(
                video_id = %id,
                thumbnail_count = update.thumbnail_count,
                duration = update.video_duration,
                "Video status updated to completed"
            );
            return Ok(true);
        }

        self.explain_unapplied(id).await
    }

    /// Mark a record `failed` with a human-readable error message.
    pub async fn mark_failed(&self, id: &VideoId, error_message: &str) -> DbResult<bool> {
        let applied = sqlx::query(
            "UPDATE videos SET status = 'failed', error_message = $2, updated_at = NOW() \
             WHERE id = $1 AND status <> 'completed'",
        )
        .bind(id.as_str())
        .bind(error_message)
        .execute(&self.pool)
        .await?
        .rows_affected()
            > 0;

        if applied {
            warn!(video_id = %id, error = error_message, "Video status updated to failed");
            return Ok(true);
        }

        self.explain_unapplied(id).await
    }

    /// A guarded transition touched zero rows: either the record is missing
    /// (an error) or it is already `completed` (not applied).
    async fn explain_unapplied(&self, id: &VideoId) -> DbResult<bool> {
        match self.get(id).await? {
            None => Err(DbError::not_found(id.as_str())),
            Some(record) => {
                info!(
                    video_id = %id,
                    status = %record.status,
                    "Transition skipped; record already completed"
                );
                Ok(false)
            }
        }
    }
}
