//! Core engine components

pub mod audit;
pub mod budget;
pub mod dispatcher;
pub mod errors;
pub mod handlers;
pub mod reconciler;
pub mod retry;
pub mod router;
pub mod types;

pub use audit::{AUDIT_STATUS_ERROR, AUDIT_STATUS_PROCESSED, AuditLogEntry, AuditLogWriter};
pub use budget::TimeBudget;
pub use dispatcher::Engine;
pub use errors::{EngineError, Result};
pub use reconciler::{JobStatusReconciler, ReconcileResult};
pub use retry::{RetryConfig, RetryPolicies, RetryPolicy};
pub use router::IntegrationRouter;
