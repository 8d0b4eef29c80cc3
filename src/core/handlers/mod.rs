//! Change handlers
//!
//! One handler per change kind, all behind the same process-one-record
//! contract. A handler runs the staged pipeline: decode and validate the
//! payload, invoke the carrier operation under the transient-network retry
//! policy, apply the local store mutations under the transient-store policy,
//! then append audit entries and mark the record processed.
//!
//! Errors returned from `process` are caught at the dispatcher boundary and
//! converted into a record-level Error; they never halt the rest of the job.

pub mod carrier_rate_plan;
pub mod customer_association;
pub mod customer_rate_plan;
pub mod identifier_swap;
pub mod status_update;
pub mod username_update;

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::audit::{AuditLogEntry, AuditLogWriter};
use crate::core::errors::{EngineError, Result};
use crate::core::retry::RetryPolicies;
use crate::core::types::{
    BulkChangeJob, ChangeType, Device, DeviceChangeRecord, RecordOutcome, RecordStatus,
};
use crate::carriers::CarrierSession;
use crate::storage::BulkChangeStore;

pub use carrier_rate_plan::CarrierRatePlanHandler;
pub use customer_association::CustomerAssociationHandler;
pub use customer_rate_plan::CustomerRatePlanHandler;
pub use identifier_swap::IdentifierSwapHandler;
pub use status_update::StatusUpdateHandler;
pub use username_update::UsernameUpdateHandler;

/// Uniform per-record processing contract.
#[async_trait]
pub trait ChangeHandler: Send + Sync {
    async fn process(
        &self,
        job: &BulkChangeJob,
        record: &DeviceChangeRecord,
        session: &CarrierSession,
    ) -> Result<RecordOutcome>;
}

impl std::fmt::Debug for dyn ChangeHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChangeHandler")
    }
}

/// Dependencies shared by every handler.
#[derive(Clone)]
pub struct HandlerContext {
    pub store: Arc<dyn BulkChangeStore>,
    pub audit: AuditLogWriter,
    pub retries: Arc<RetryPolicies>,
    pub processed_by: String,
}

impl HandlerContext {
    pub fn new(
        store: Arc<dyn BulkChangeStore>,
        retries: Arc<RetryPolicies>,
        processed_by: impl Into<String>,
    ) -> Self {
        Self {
            audit: AuditLogWriter::new(store.clone()),
            store,
            retries,
            processed_by: processed_by.into(),
        }
    }
}

/// Payload variant does not match the job's declared change type.
pub(crate) fn mismatched_payload(found: ChangeType, expected: ChangeType) -> EngineError {
    EngineError::Validation(format!(
        "change payload is {found} but the job expects {expected}"
    ))
}

/// Look up the device a record targets; absence is a validation failure.
pub(crate) async fn find_target_device(
    ctx: &HandlerContext,
    job: &BulkChangeJob,
    record: &DeviceChangeRecord,
) -> Result<Device> {
    ctx.store
        .find_device(job.service_provider_id, &record.identifier)
        .await?
        .ok_or_else(|| {
            EngineError::Validation(format!("device not found for {}", record.identifier))
        })
}

/// Finish a record successfully: final audit entry plus the processed mark.
pub(crate) async fn complete_processed(
    ctx: &HandlerContext,
    record: &DeviceChangeRecord,
    description: &str,
    detail: &str,
) -> Result<RecordOutcome> {
    ctx.audit
        .append(AuditLogEntry::success(
            record.id,
            description,
            record.change_request.clone(),
            detail,
        ))
        .await?;
    ctx.store
        .write_record_outcome(
            record.id,
            RecordStatus::Processed,
            false,
            detail,
            &ctx.processed_by,
        )
        .await?;
    Ok(RecordOutcome::processed(record.id, detail))
}

/// Finish a record whose local writes failed after the carrier call already
/// succeeded. The external side effect is not undone; the record is marked
/// processed with a data-consistency error for operator follow-up.
pub(crate) async fn complete_with_consistency_error(
    ctx: &HandlerContext,
    record: &DeviceChangeRecord,
    description: &str,
    cause: &EngineError,
) -> Result<RecordOutcome> {
    let detail = format!("carrier change applied but local update failed: {cause}");
    ctx.audit
        .append(AuditLogEntry::failure(
            record.id,
            description,
            record.change_request.clone(),
            detail.clone(),
        ))
        .await?;
    ctx.store
        .write_record_outcome(
            record.id,
            RecordStatus::Error,
            true,
            &detail,
            &ctx.processed_by,
        )
        .await?;
    Ok(RecordOutcome::errored(record.id, detail))
}

/// Record the request/response capture of a successful carrier call.
pub(crate) async fn audit_carrier_call(
    ctx: &HandlerContext,
    record_id: i64,
    call: &crate::carriers::CarrierCall,
) -> Result<()> {
    ctx.audit
        .append(AuditLogEntry::success(
            record_id,
            call.action.clone(),
            call.request_text.clone(),
            format!("{}: {}", call.status, call.response_text),
        ))
        .await
}
