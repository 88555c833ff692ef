//! Redis Streams task queue.
//!
//! This crate provides:
//! - Task enqueueing via Redis Streams
//! - Blocking single-message consumption through a consumer group
//!   (one outstanding delivery per worker)
//! - Explicit acknowledgment decisions as `Disposition` values
//! - Bounded retries with a dead-letter stream
//! - Pending-claim recovery of deliveries from crashed workers

pub mod error;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use queue::{Delivery, Disposition, QueueConfig, TaskQueue};
