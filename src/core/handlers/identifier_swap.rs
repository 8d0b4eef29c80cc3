//! ICCID/IMEI swap handler

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::carriers::{CarrierClient, CarrierSession};
use crate::core::errors::{EngineError, Result};
use crate::core::handlers::{
    ChangeHandler, HandlerContext, audit_carrier_call, complete_processed,
    complete_with_consistency_error, find_target_device, mismatched_payload,
};
use crate::core::types::{
    BulkChangeJob, ChangeRequest, DeviceChangeRecord, DeviceIdentifier, IdentifierKind,
    RecordOutcome,
};

pub struct IdentifierSwapHandler {
    carrier: Arc<dyn CarrierClient>,
    ctx: HandlerContext,
}

impl IdentifierSwapHandler {
    pub fn new(carrier: Arc<dyn CarrierClient>, ctx: HandlerContext) -> Self {
        Self { carrier, ctx }
    }
}

#[async_trait]
impl ChangeHandler for IdentifierSwapHandler {
    async fn process(
        &self,
        job: &BulkChangeJob,
        record: &DeviceChangeRecord,
        session: &CarrierSession,
    ) -> Result<RecordOutcome> {
        let change = match ChangeRequest::decode(&record.change_request)? {
            ChangeRequest::IdentifierSwap(change) => change,
            other => return Err(mismatched_payload(other.change_type(), job.change_type)),
        };

        if !matches!(
            change.identifier_type,
            IdentifierKind::Iccid | IdentifierKind::Imei
        ) {
            return Err(EngineError::Validation(format!(
                "cannot swap {} identifiers",
                change.identifier_type
            )));
        }
        let (old_value, new_value) = match (change.old_value(), change.new_value()) {
            (Some(old), Some(new)) if !old.trim().is_empty() && !new.trim().is_empty() => {
                (old.to_string(), new.to_string())
            }
            _ => {
                return Err(EngineError::Validation(
                    "identifier swap requires both the old and the new value".to_string(),
                ));
            }
        };

        let device = find_target_device(&self.ctx, job, record).await?;
        if device.identifier_value(change.identifier_type) != Some(old_value.as_str()) {
            return Err(EngineError::Validation(format!(
                "device does not carry {} {}",
                change.identifier_type, old_value
            )));
        }

        let probe = DeviceIdentifier {
            kind: change.identifier_type,
            value: new_value.clone(),
        };
        if self
            .ctx
            .store
            .identifier_in_use(job.service_provider_id, &probe, device.id)
            .await?
        {
            return Err(EngineError::Validation(format!(
                "{} {} is already in use",
                change.identifier_type, new_value
            )));
        }

        debug!(
            record_id = record.id,
            device_id = device.id,
            kind = %change.identifier_type,
            "swapping device identifier"
        );

        let call = self
            .ctx
            .retries
            .network_call(|| self.carrier.swap_identifier(session, &device, &change))
            .await?;
        audit_carrier_call(&self.ctx, record.id, &call).await?;

        let write = self
            .ctx
            .retries
            .store_call(|| {
                self.ctx.store.update_device_identifier(
                    device.id,
                    change.identifier_type,
                    &new_value,
                    &self.ctx.processed_by,
                )
            })
            .await;
        if let Err(cause) = write {
            return complete_with_consistency_error(
                &self.ctx,
                record,
                "device identifier swap",
                &cause,
            )
            .await;
        }

        // Optional follow-on assignment once the swap took effect.
        if let Some(rate_plan) = &change.customer_rate_plan {
            let write = self
                .ctx
                .retries
                .store_call(|| {
                    self.ctx.store.update_device_customer_rate_plan(
                        device.id,
                        rate_plan,
                        &self.ctx.processed_by,
                    )
                })
                .await;
            if let Err(cause) = write {
                return complete_with_consistency_error(
                    &self.ctx,
                    record,
                    "customer rate plan update after identifier swap",
                    &cause,
                )
                .await;
            }
        }

        complete_processed(
            &self.ctx,
            record,
            "device identifier swap",
            &format!(
                "{} changed from {} to {}",
                change.identifier_type, old_value, new_value
            ),
        )
        .await
    }
}
