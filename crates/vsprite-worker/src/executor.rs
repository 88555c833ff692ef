//! Task consumption loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{error, info, warn};

use vsprite_queue::{Delivery, Disposition, TaskQueue};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::{process_task, ProcessingContext};

/// Consecutive consume failures tolerated before the loop gives up and
/// exits for a supervisor restart.
const MAX_CONSUME_FAILURES: u32 = 12;

/// Drives the consume -> process -> acknowledge loop.
///
/// One executor holds at most one unacknowledged delivery at a time. A
/// shutdown signal stops delivery acquisition; a task already in flight
/// runs to its disposition before the loop exits.
pub struct TaskExecutor {
    queue: Arc<TaskQueue>,
    ctx: ProcessingContext,
    config: WorkerConfig,
    consumer_name: String,
}

impl TaskExecutor {
    pub fn new(queue: Arc<TaskQueue>, ctx: ProcessingContext, config: WorkerConfig) -> Self {
        let consumer_name = format!(
            "{}-{}",
            hostname(),
            uuid::Uuid::new_v4().simple()
        );

        Self {
            queue,
            ctx,
            config,
            consumer_name,
        }
    }

    /// Run until the shutdown signal flips.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> WorkerResult<()> {
        self.queue.init().await?;

        info!(consumer = %self.consumer_name, "Worker consuming tasks");

        let mut next_claim_sweep = Instant::now() + self.config.claim_interval;
        let mut consume_failures: u32 = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            // Recover deliveries stranded by crashed workers, at most one
            // per sweep so new work is not starved.
            if Instant::now() >= next_claim_sweep {
                next_claim_sweep = Instant::now() + self.config.claim_interval;
                match self.queue.claim_pending(&self.consumer_name).await {
                    Ok(Some(delivery)) => {
                        self.handle_delivery(delivery).await;
                        continue;
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Pending-claim sweep failed: {}", e),
                }
            }

            let block_ms = self.config.consume_block.as_millis() as u64;
            let consumed = tokio::select! {
                result = self.queue.consume_one(&self.consumer_name, block_ms) => result,
                _ = shutdown.changed() => break,
            };

            match consumed {
                Ok(Some(delivery)) => {
                    consume_failures = 0;
                    self.handle_delivery(delivery).await;
                }
                Ok(None) => consume_failures = 0,
                Err(e) => {
                    consume_failures += 1;
                    error!(
                        attempt = consume_failures,
                        "Failed to consume from queue: {}", e
                    );
                    if consume_failures >= MAX_CONSUME_FAILURES {
                        // Persistent broker loss; exit for supervisor restart
                        return Err(WorkerError::Queue(e));
                    }
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }

        info!(consumer = %self.consumer_name, "Worker loop stopped");
        Ok(())
    }

    /// Process one delivery and apply its disposition exactly once.
    async fn handle_delivery(&self, delivery: Delivery) {
        let (disposition, failure) = match process_task(&self.ctx, &delivery.task).await {
            Ok(()) => (Disposition::Ack, None),
            Err(e) => (Disposition::NackRequeue, Some(e.to_string())),
        };

        if let Err(e) = self
            .queue
            .apply_disposition(&delivery, disposition, failure.as_deref())
            .await
        {
            // The delivery stays pending and a later claim sweep recovers
            // it. Status writes are guarded, so the re-run is harmless.
            error!(
                message_id = %delivery.message_id,
                "Failed to apply disposition: {}", e
            );
        }
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "worker".to_string())
}
