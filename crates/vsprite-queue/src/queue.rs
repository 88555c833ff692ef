//! Task queue over Redis Streams.

use redis::AsyncCommands;
use tracing::{debug, info, warn};

use vsprite_models::ProcessingTask;

use crate::error::{QueueError, QueueResult};

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream name for processing tasks
    pub stream_name: String,
    /// Consumer group name
    pub consumer_group: String,
    /// Dead letter stream name
    pub dlq_stream_name: String,
    /// Delivery attempts before a task moves to the dead letter stream
    pub max_retries: u32,
    /// Minimum idle time before another consumer may claim a pending
    /// delivery (crash recovery), in milliseconds
    pub claim_min_idle_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "vsprite:tasks".to_string(),
            consumer_group: "vsprite:workers".to_string(),
            dlq_stream_name: "vsprite:dlq".to_string(),
            max_retries: 5,
            claim_min_idle_ms: 300_000,
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            stream_name: std::env::var("QUEUE_STREAM")
                .unwrap_or_else(|_| "vsprite:tasks".to_string()),
            consumer_group: std::env::var("QUEUE_CONSUMER_GROUP")
                .unwrap_or_else(|_| "vsprite:workers".to_string()),
            dlq_stream_name: std::env::var("QUEUE_DLQ_STREAM")
                .unwrap_or_else(|_| "vsprite:dlq".to_string()),
            max_retries: std::env::var("QUEUE_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            claim_min_idle_ms: std::env::var("QUEUE_CLAIM_MIN_IDLE_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(|s| s * 1000)
                .unwrap_or(300_000),
        }
    }
}

/// One delivery of a processing task.
///
/// `attempt` counts prior deliveries of this task; it rides inside the
/// stream entry so requeues and claims keep the count without external
/// bookkeeping.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message_id: String,
    pub task: ProcessingTask,
    pub attempt: u32,
}

/// The handler's acknowledgment decision for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Pipeline reached a terminal status write; remove the message.
    Ack,
    /// Pipeline raised; redeliver (bounded by `max_retries`, then DLQ).
    NackRequeue,
    /// Message is unprocessable (e.g. malformed); drop without retry.
    NackDrop,
}

/// Task queue client.
///
/// Owns its Redis client; constructed once at startup and shared by
/// reference. Each operation checks out a multiplexed connection, so
/// acknowledgments are fully flushed before `close` returns.
pub struct TaskQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl TaskQueue {
    /// Create a new task queue client.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    /// Initialize the queue (create the consumer group if missing).
    ///
    /// The group starts at `0` so entries added before the group existed
    /// are still delivered.
    pub async fn init(&self) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => info!("Created consumer group: {}", self.config.consumer_group),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!("Consumer group already exists: {}", self.config.consumer_group);
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    /// Enqueue a processing task. Returns the stream message ID.
    pub async fn enqueue(&self, task: &ProcessingTask) -> QueueResult<String> {
        self.add_to_stream(task, 0).await
    }

    async fn add_to_stream(&self, task: &ProcessingTask, attempt: u32) -> QueueResult<String> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(task)?;

        let message_id: String = redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("*")
            .arg("task")
            .arg(&payload)
            .arg("attempt")
            .arg(attempt)
            .query_async(&mut conn)
            .await?;

        info!(
            video_id = %task.video_id,
            message_id = %message_id,
            attempt,
            "Enqueued processing task"
        );

        Ok(message_id)
    }

    /// Block up to `block_ms` for one new delivery.
    ///
    /// COUNT is pinned to 1: a consumer holds at most one unacknowledged
    /// message, which is the prefetch contract the pipeline's re-entrancy
    /// guarantees rest on.
    pub async fn consume_one(
        &self,
        consumer_name: &str,
        block_ms: u64,
    ) -> QueueResult<Option<Delivery>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: redis::streams::StreamReadReply = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg("COUNT")
            .arg(1)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(">")
            .query_async(&mut conn)
            .await?;

        for stream_key in result.keys {
            for entry in stream_key.ids {
                match self.parse_entry(&entry.id, &entry.map) {
                    Some(delivery) => {
                        debug!(
                            video_id = %delivery.task.video_id,
                            message_id = %delivery.message_id,
                            "Consumed task from stream"
                        );
                        return Ok(Some(delivery));
                    }
                    None => {
                        // Malformed entry; drop so it cannot wedge the group
                        warn!(message_id = %entry.id, "Dropping malformed stream entry");
                        self.ack(&entry.id).await.ok();
                    }
                }
            }
        }

        Ok(None)
    }

    fn parse_entry(
        &self,
        message_id: &str,
        map: &std::collections::HashMap<String, redis::Value>,
    ) -> Option<Delivery> {
        let payload = match map.get("task") {
            Some(redis::Value::BulkString(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
            _ => return None,
        };

        let task: ProcessingTask = match serde_json::from_str(&payload) {
            Ok(task) => task,
            Err(e) => {
                warn!(message_id = %message_id, "Failed to parse task payload: {}", e);
                return None;
            }
        };

        let attempt = match map.get("attempt") {
            Some(redis::Value::BulkString(bytes)) => String::from_utf8_lossy(bytes)
                .parse::<u32>()
                .unwrap_or(0),
            Some(redis::Value::Int(n)) => *n as u32,
            _ => 0,
        };

        Some(Delivery {
            message_id: message_id.to_string(),
            task,
            attempt,
        })
    }

    /// Acknowledge a delivery (remove it from the stream).
    pub async fn ack(&self, message_id: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        redis::cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        redis::cmd("XDEL")
            .arg(&self.config.stream_name)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        debug!(message_id = %message_id, "Acknowledged delivery");
        Ok(())
    }

    /// Apply the handler's decision to a delivery.
    pub async fn apply_disposition(
        &self,
        delivery: &Delivery,
        disposition: Disposition,
        error: Option<&str>,
    ) -> QueueResult<()> {
        match disposition {
            Disposition::Ack => self.ack(&delivery.message_id).await,
            Disposition::NackRequeue => self.requeue(delivery, error.unwrap_or("unknown")).await,
            Disposition::NackDrop => {
                warn!(
                    video_id = %delivery.task.video_id,
                    message_id = %delivery.message_id,
                    "Dropping delivery without retry"
                );
                self.ack(&delivery.message_id).await
            }
        }
    }

    /// Requeue a failed delivery, or dead-letter it once the attempt count
    /// reaches the configured cap.
    async fn requeue(&self, delivery: &Delivery, error: &str) -> QueueResult<()> {
        let next_attempt = delivery.attempt + 1;

        if next_attempt >= self.config.max_retries {
            warn!(
                video_id = %delivery.task.video_id,
                attempts = next_attempt,
                "Task exceeded max retries, moving to dead letter stream"
            );
            return self.dead_letter(delivery, error).await;
        }

        self.add_to_stream(&delivery.task, next_attempt).await?;
        self.ack(&delivery.message_id).await?;

        info!(
            video_id = %delivery.task.video_id,
            attempt = next_attempt,
            max_retries = self.config.max_retries,
            "Task requeued for redelivery"
        );

        Ok(())
    }

    /// Move a delivery to the dead letter stream and acknowledge it.
    async fn dead_letter(&self, delivery: &Delivery, error: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(&delivery.task)?;

        redis::cmd("XADD")
            .arg(&self.config.dlq_stream_name)
            .arg("*")
            .arg("task")
            .arg(&payload)
            .arg("error")
            .arg(error)
            .arg("original_id")
            .arg(&delivery.message_id)
            .query_async::<()>(&mut conn)
            .await?;

        self.ack(&delivery.message_id).await?;

        warn!(
            video_id = %delivery.task.video_id,
            error = error,
            "Task moved to dead letter stream"
        );
        Ok(())
    }

    /// Claim one delivery pending longer than the configured idle time.
    /// This recovers tasks whose worker crashed before deciding.
    ///
    /// `XAUTOCLAIM` scans the pending entries list from `0-0` and hands
    /// over the first entry idle past the threshold, consumer-agnostic.
    pub async fn claim_pending(&self, consumer_name: &str) -> QueueResult<Option<Delivery>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: redis::streams::StreamAutoClaimReply = redis::cmd("XAUTOCLAIM")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg(self.config.claim_min_idle_ms)
            .arg("0-0")
            .arg("COUNT")
            .arg(1)
            .query_async(&mut conn)
            .await?;

        for entry in result.claimed {
            match self.parse_entry(&entry.id, &entry.map) {
                Some(delivery) => {
                    info!(
                        video_id = %delivery.task.video_id,
                        message_id = %delivery.message_id,
                        "Claimed pending delivery from crashed worker"
                    );
                    return Ok(Some(delivery));
                }
                None => {
                    warn!(message_id = %entry.id, "Dropping malformed pending entry");
                    self.ack(&entry.id).await.ok();
                }
            }
        }

        Ok(None)
    }

    /// Get queue length.
    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(&self.config.stream_name).await?;
        Ok(len)
    }

    /// Get dead letter stream length.
    pub async fn dlq_len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(&self.config.dlq_stream_name).await?;
        Ok(len)
    }

    /// Configured retry cap.
    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    /// Close the client. Every acknowledgment is awaited before this point,
    /// so nothing is left buffered; unacknowledged deliveries stay pending
    /// for another consumer to claim.
    pub fn close(&self) {
        info!("Task queue client closed");
    }
}
