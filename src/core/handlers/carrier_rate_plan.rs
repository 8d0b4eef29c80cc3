//! Carrier-side rate plan change handler

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

pub struct CarrierRatePlanHandler {
    carrier: Arc<dyn CarrierClient>,
    ctx: HandlerContext,
}

impl CarrierRatePlanHandler {
    pub fn new(carrier: Arc<dyn CarrierClient>, ctx: HandlerContext) -> Self {
        Self { carrier, ctx }
    }
}

#[async_trait]
impl ChangeHandler for CarrierRatePlanHandler {
    async fn process(
        &self,
        job: &BulkChangeJob,
        record: &DeviceChangeRecord,
        session: &CarrierSession,
    ) -> Result<RecordOutcome> {
        let change = match ChangeRequest::decode(&record.change_request)? {
            ChangeRequest::CarrierRatePlan(change) => change,
            other => return Err(mismatched_payload(other.change_type(), job.change_type)),
        };

        if change.carrier_rate_plan.trim().is_empty() {
            return Err(EngineError::Validation(
                "carrier rate plan change requires a rate plan code".to_string(),
            ));
        }

        let device = find_target_device(&self.ctx, job, record).await?;
        if device.carrier_rate_plan.as_deref() == Some(change.carrier_rate_plan.as_str()) {
            return Err(EngineError::Validation(format!(
                "device is already on rate plan {}",
                change.carrier_rate_plan
            )));
        }

        debug!(
            record_id = record.id,
            device_id = device.id,
            rate_plan = %change.carrier_rate_plan,
            "updating carrier rate plan"
        );

        let call = self
            .ctx
            .retries
            .network_call(|| self.carrier.update_rate_plan(session, &device, &change))
            .await?;
        audit_carrier_call(&self.ctx, record.id, &call).await?;

        let write = self
            .ctx
            .retries
            .store_call(|| {
                self.ctx.store.update_device_carrier_rate_plan(
                    device.id,
                    &change.carrier_rate_plan,
                    change.comm_plan.as_deref(),
                    &self.ctx.processed_by,
                )
            })
            .await;
        if let Err(cause) = write {
            return complete_with_consistency_error(
                &self.ctx,
                record,
                "carrier rate plan update",
                &cause,
            )
            .await;
        }

        complete_processed(
            &self.ctx,
            record,
            "carrier rate plan update",
            &format!("rate plan changed to {}", change.carrier_rate_plan),
        )
        .await
    }
}
