//! Sprite processing worker binary.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vsprite_db::VideoStore;
use vsprite_queue::TaskQueue;
use vsprite_storage::ObjectStore;
use vsprite_worker::{ProcessingContext, TaskExecutor, WorkerConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vsprite=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting vsprite-worker");

    let config = WorkerConfig::from_env();
    if let Err(e) = config.validate() {
        error!("Invalid worker configuration: {}", e);
        std::process::exit(1);
    }
    info!("Worker config: {:?}", config);

    let storage = match ObjectStore::from_env() {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to create object store client: {}", e);
            std::process::exit(1);
        }
    };

    let db = match VideoStore::from_env().await {
        Ok(d) => Arc::new(d),
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let queue = match TaskQueue::from_env() {
        Ok(q) => Arc::new(q),
        Err(e) => {
            error!("Failed to create task queue: {}", e);
            std::process::exit(1);
        }
    };

    let ctx = ProcessingContext {
        storage,
        db,
        layout: config.layout.clone(),
        work_dir: config.work_dir.clone().into(),
    };

    let executor = TaskExecutor::new(queue.clone(), ctx, config);

    // Flip the shutdown signal on Ctrl+C; in-flight work finishes first
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_tx.send(true).ok();
    });

    if let Err(e) = executor.run(shutdown_rx).await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    queue.close();
    info!("Worker shutdown complete");
}
