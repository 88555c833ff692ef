//! MinIO object store client.
//!
//! This crate provides:
//! - File and byte uploads through the S3 API
//! - Downloads, stat, and byte-range reads for stream delivery
//! - Object deletion for ingestion compensation
//! - The key layout shared by ingestion, workers, and delivery

pub mod client;
pub mod error;
pub mod keys;

pub use client::{ObjectStat, ObjectStore, StoreConfig};
pub use error::{StorageError, StorageResult};
