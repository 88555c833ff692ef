//! Postgres video record store.
//!
//! One row per uploaded video; status transitions follow the lifecycle
//! machine in `vsprite_models::VideoStatus` and are enforced with guarded
//! UPDATEs so a redelivered task can never move a record out of
//! `completed`. A `failed` record stays claimable: the broker keeps
//! redelivering its task until the attempt cap dead-letters it.

pub mod error;
pub mod store;

pub use error::{DbError, DbResult};
pub use store::{CompletionUpdate, DbConfig, VideoStore};
