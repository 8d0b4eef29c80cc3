//! Customer association handler

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

pub struct CustomerAssociationHandler {
    carrier: Arc<dyn CarrierClient>,
    ctx: HandlerContext,
}

impl CustomerAssociationHandler {
    pub fn new(carrier: Arc<dyn CarrierClient>, ctx: HandlerContext) -> Self {
        Self { carrier, ctx }
    }
}

#[async_trait]
impl ChangeHandler for CustomerAssociationHandler {
    async fn process(
        &self,
        job: &BulkChangeJob,
        record: &DeviceChangeRecord,
        session: &CarrierSession,
    ) -> Result<RecordOutcome> {
        let change = match ChangeRequest::decode(&record.change_request)? {
            ChangeRequest::CustomerAssociation(change) => change,
            other => return Err(mismatched_payload(other.change_type(), job.change_type)),
        };

        if change.customer_ref.trim().is_empty() {
            return Err(EngineError::Validation(
                "customer association requires a customer reference".to_string(),
            ));
        }

        let device = find_target_device(&self.ctx, job, record).await?;

        debug!(
            record_id = record.id,
            device_id = device.id,
            customer = %change.customer_ref,
            "associating device with customer"
        );

        let call = self
            .ctx
            .retries
            .network_call(|| self.carrier.associate_customer(session, &device, &change))
            .await?;
        audit_carrier_call(&self.ctx, record.id, &call).await?;

        let write = self
            .ctx
            .retries
            .store_call(|| {
                self.ctx.store.assign_customer(
                    device.id,
                    &change.customer_ref,
                    change.site_id,
                    &self.ctx.processed_by,
                )
            })
            .await;
        if let Err(cause) = write {
            return complete_with_consistency_error(
                &self.ctx,
                record,
                "customer association",
                &cause,
            )
            .await;
        }

        complete_processed(
            &self.ctx,
            record,
            "customer association",
            &format!("device associated with customer {}", change.customer_ref),
        )
        .await
    }
}
