//! Sprite sheet processing worker.
//!
//! Consumes processing tasks from the queue one at a time and runs the
//! download -> probe -> extract -> tile -> upload -> record pipeline,
//! acknowledging each delivery exactly once.

pub mod config;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod workspace;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::TaskExecutor;
pub use pipeline::{process_task, ProcessingContext};
pub use workspace::TaskWorkspace;
