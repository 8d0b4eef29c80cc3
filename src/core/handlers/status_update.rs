//! Device status change handler (activate, deactivate, suspend, restore)

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::carriers::{CarrierClient, CarrierSession};
use crate::core::errors::{EngineError, Result};
use crate::core::handlers::{
    ChangeHandler, HandlerContext, audit_carrier_call, complete_processed,
    complete_with_consistency_error, find_target_device, mismatched_payload,
};
use crate::core::types::{BulkChangeJob, ChangeRequest, DeviceChangeRecord, RecordOutcome};

pub struct StatusUpdateHandler {
    carrier: Arc<dyn CarrierClient>,
    ctx: HandlerContext,
}

impl StatusUpdateHandler {
    pub fn new(carrier: Arc<dyn CarrierClient>, ctx: HandlerContext) -> Self {
        Self { carrier, ctx }
    }
}

#[async_trait]
impl ChangeHandler for StatusUpdateHandler {
    async fn process(
        &self,
        job: &BulkChangeJob,
        record: &DeviceChangeRecord,
        session: &CarrierSession,
    ) -> Result<RecordOutcome> {
        let change = match ChangeRequest::decode(&record.change_request)? {
            ChangeRequest::StatusUpdate(change) => change,
            other => return Err(mismatched_payload(other.change_type(), job.change_type)),
        };

        if change.target_status.trim().is_empty() {
            return Err(EngineError::Validation(
                "status update requires a target status".to_string(),
            ));
        }
        if change.is_activation()
            && change
                .rate_plan_code
                .as_deref()
                .is_none_or(|plan| plan.trim().is_empty())
        {
            return Err(EngineError::Validation(
                "activation requires a rate plan code".to_string(),
            ));
        }

        let device = find_target_device(&self.ctx, job, record).await?;
        if !change.ignore_current_status
            && device.status.eq_ignore_ascii_case(&change.target_status)
        {
            return Err(EngineError::Validation(format!(
                "device is already in status {}",
                change.target_status
            )));
        }

        debug!(
            record_id = record.id,
            device_id = device.id,
            target = %change.target_status,
            "updating device status"
        );

        let call = self
            .ctx
            .retries
            .network_call(|| self.carrier.update_status(session, &device, &change))
            .await?;
        audit_carrier_call(&self.ctx, record.id, &call).await?;

        let write = self
            .ctx
            .retries
            .store_call(|| {
                self.ctx.store.update_device_status(
                    device.id,
                    &change.target_status,
                    record.msisdn.as_deref(),
                    &self.ctx.processed_by,
                )
            })
            .await;
        if let Err(cause) = write {
            return complete_with_consistency_error(
                &self.ctx,
                record,
                "device status update",
                &cause,
            )
            .await;
        }

        complete_processed(
            &self.ctx,
            record,
            "device status update",
            &format!("status change to {} successful", change.target_status),
        )
        .await
    }
}
