//! Append-only audit trail for per-step processing outcomes

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::errors::Result;
use crate::storage::BulkChangeStore;

/// Response status recorded on a successful step.
pub const AUDIT_STATUS_PROCESSED: &str = "PROCESSED";
/// Response status recorded on a failed step.
pub const AUDIT_STATUS_ERROR: &str = "ERROR";

/// One immutable audit entry tied to a device change record. Never mutated
/// or deleted once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub record_id: i64,
    pub description: String,
    pub request_text: String,
    pub response_text: String,
    pub response_status: String,
    pub has_errors: bool,
    pub logged_at: DateTime<Utc>,
}

impl AuditLogEntry {
    /// Entry for a step that completed successfully.
    pub fn success(
        record_id: i64,
        description: impl Into<String>,
        request_text: impl Into<String>,
        response_text: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            record_id,
            description: description.into(),
            request_text: request_text.into(),
            response_text: response_text.into(),
            response_status: AUDIT_STATUS_PROCESSED.to_string(),
            has_errors: false,
            logged_at: Utc::now(),
        }
    }

    /// Entry for a step that failed.
    pub fn failure(
        record_id: i64,
        description: impl Into<String>,
        request_text: impl Into<String>,
        error_text: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            record_id,
            description: description.into(),
            request_text: request_text.into(),
            response_text: error_text.into(),
            response_status: AUDIT_STATUS_ERROR.to_string(),
            has_errors: true,
            logged_at: Utc::now(),
        }
    }
}

/// Writer appending audit entries through the store.
#[derive(Clone)]
pub struct AuditLogWriter {
    store: Arc<dyn BulkChangeStore>,
}

impl AuditLogWriter {
    pub fn new(store: Arc<dyn BulkChangeStore>) -> Self {
        Self { store }
    }

    pub async fn append(&self, entry: AuditLogEntry) -> Result<()> {
        self.store.append_audit_entry(entry).await
    }
}
