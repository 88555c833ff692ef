//! Upload and delivery HTTP API.
//!
//! Ingestion: multipart upload -> object store -> record insert -> task
//! enqueue, with compensation of partial writes. Delivery: status,
//! metadata, sprite, and byte-range stream reads gated on the lifecycle
//! status.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod range;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
