//! Customer rate plan assignment handler
//!
//! Customer rate plans live only in the local inventory mirror; there is no
//! carrier-side operation for this change kind.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::carriers::{CarrierClient, CarrierSession};
use crate::core::audit::AuditLogEntry;
use crate::core::errors::{EngineError, Result};
use crate::core::handlers::{
    ChangeHandler, HandlerContext, complete_processed, find_target_device, mismatched_payload,
};
use crate::core::types::{BulkChangeJob, ChangeRequest, DeviceChangeRecord, RecordOutcome};

pub struct CustomerRatePlanHandler {
    // kept for parity with the registration path; this change kind never
    // reaches the carrier
    _carrier: Arc<dyn CarrierClient>,
    ctx: HandlerContext,
}

impl CustomerRatePlanHandler {
    pub fn new(carrier: Arc<dyn CarrierClient>, ctx: HandlerContext) -> Self {
        Self {
            _carrier: carrier,
            ctx,
        }
    }
}

#[async_trait]
impl ChangeHandler for CustomerRatePlanHandler {
    async fn process(
        &self,
        job: &BulkChangeJob,
        record: &DeviceChangeRecord,
        _session: &CarrierSession,
    ) -> Result<RecordOutcome> {
        let change = match ChangeRequest::decode(&record.change_request)? {
            ChangeRequest::CustomerRatePlan(change) => change,
            other => return Err(mismatched_payload(other.change_type(), job.change_type)),
        };

        if change.customer_rate_plan_id.is_none() && change.customer_pool_id.is_none() {
            return Err(EngineError::Validation(
                "customer rate plan change requires a plan or a pool".to_string(),
            ));
        }

        let device = find_target_device(&self.ctx, job, record).await?;

        debug!(
            record_id = record.id,
            device_id = device.id,
            plan_id = ?change.customer_rate_plan_id,
            pool_id = ?change.customer_pool_id,
            "assigning customer rate plan"
        );

        self.ctx
            .retries
            .store_call(|| {
                self.ctx.store.update_device_customer_rate_plan(
                    device.id,
                    &change,
                    &self.ctx.processed_by,
                )
            })
            .await?;
        self.ctx
            .audit
            .append(AuditLogEntry::success(
                record.id,
                "customer rate plan update",
                record.change_request.clone(),
                "local rate plan assignment applied",
            ))
            .await?;

        complete_processed(
            &self.ctx,
            record,
            "customer rate plan update",
            "customer rate plan assigned",
        )
        .await
    }
}
