//! # bulkchange-rs
//!
//! Bulk device change processing engine. Takes a previously-created batch of
//! per-device change requests (a "bulk change") and drives each request to
//! completion against one of several heterogeneous carrier systems, under a
//! wall-clock execution budget, with bounded retries, per-record failure
//! isolation, and safe resumability across invocations.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bulkchange_rs::{Config, Engine, RetryPolicies, SeaOrmStore};
//! use bulkchange_rs::queue::{ContinuationMessage, LogSink};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/engine.yaml").await?;
//!     let store = Arc::new(SeaOrmStore::new(config.database()).await?);
//!     store.migrate().await?;
//!
//!     let engine = Engine::new(
//!         store,
//!         config.carriers().build_registry()?,
//!         Arc::new(LogSink),
//!         Arc::new(LogSink),
//!         config.worker().clone(),
//!         RetryPolicies::new(
//!             config.retry().network.clone(),
//!             config.retry().store.clone(),
//!         ),
//!     );
//!
//!     let outcome = engine.run(&ContinuationMessage::new(42)).await?;
//!     println!("run outcome: {outcome:?}");
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod carriers;
pub mod config;
pub mod core;
pub mod queue;
pub mod storage;

// Re-export main types
pub use crate::config::Config;
pub use crate::core::dispatcher::Engine;
pub use crate::core::errors::{EngineError, Result};
pub use crate::core::retry::{RetryConfig, RetryPolicies};
pub use crate::core::types::{
    AbortReason, BulkChangeJob, ChangeRequest, ChangeType, Device, DeviceChangeRecord,
    DeviceIdentifier, IdentifierKind, Integration, JobStatus, RecordCounts, RecordStatus,
    RunOutcome,
};
pub use crate::storage::{BulkChangeStore, SeaOrmStore};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
