//! Username / cost center update handler

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

pub struct UsernameUpdateHandler {
    carrier: Arc<dyn CarrierClient>,
    ctx: HandlerContext,
}

impl UsernameUpdateHandler {
    pub fn new(carrier: Arc<dyn CarrierClient>, ctx: HandlerContext) -> Self {
        Self { carrier, ctx }
    }
}

#[async_trait]
impl ChangeHandler for UsernameUpdateHandler {
    async fn process(
        &self,
        job: &BulkChangeJob,
        record: &DeviceChangeRecord,
        session: &CarrierSession,
    ) -> Result<RecordOutcome> {
        let change = match ChangeRequest::decode(&record.change_request)? {
            ChangeRequest::UsernameUpdate(change) => change,
            other => return Err(mismatched_payload(other.change_type(), job.change_type)),
        };

        if change.contact_name.trim().is_empty() {
            return Err(EngineError::Validation(
                "username update requires a contact name".to_string(),
            ));
        }

        let device = find_target_device(&self.ctx, job, record).await?;

        debug!(
            record_id = record.id,
            device_id = device.id,
            "updating device username"
        );

        let call = self
            .ctx
            .retries
            .network_call(|| self.carrier.update_username(session, &device, &change))
            .await?;
        audit_carrier_call(&self.ctx, record.id, &call).await?;

        let write = self
            .ctx
            .retries
            .store_call(|| {
                self.ctx
                    .store
                    .update_device_username(device.id, &change, &self.ctx.processed_by)
            })
            .await;
        if let Err(cause) = write {
            return complete_with_consistency_error(
                &self.ctx,
                record,
                "device username update",
                &cause,
            )
            .await;
        }

        complete_processed(
            &self.ctx,
            record,
            "device username update",
            &format!("username changed to {}", change.contact_name),
        )
        .await
    }
}
