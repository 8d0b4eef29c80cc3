//! Job dispatcher
//!
//! Drives one invocation of the engine for one bulk change job: enforces the
//! single-active-run guard, loads the unprocessed page, resolves session
//! credentials once, iterates records under the time budget, reconciles the
//! aggregate and emits a continuation when a tail remains.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::carriers::{CarrierRegistry, CarrierSession};
use crate::config::WorkerConfig;
use crate::core::audit::{AuditLogEntry, AuditLogWriter};
use crate::core::budget::TimeBudget;
use crate::core::errors::{EngineError, Result};
use crate::core::handlers::{
    CarrierRatePlanHandler, ChangeHandler, CustomerAssociationHandler, CustomerRatePlanHandler,
    HandlerContext, IdentifierSwapHandler, StatusUpdateHandler, UsernameUpdateHandler,
};
use crate::core::reconciler::JobStatusReconciler;
use crate::core::retry::RetryPolicies;
use crate::core::router::IntegrationRouter;
use crate::core::types::{
    AbortReason, BulkChangeJob, ChangeType, DeviceChangeRecord, JobStatus, RunOutcome,
};
use crate::queue::{ContinuationMessage, ContinuationSink, SummarySink};
use crate::storage::BulkChangeStore;

/// The bulk device change processing engine.
pub struct Engine {
    store: Arc<dyn BulkChangeStore>,
    carriers: CarrierRegistry,
    router: IntegrationRouter,
    audit: AuditLogWriter,
    reconciler: JobStatusReconciler,
    continuations: Arc<dyn ContinuationSink>,
    worker: WorkerConfig,
    processed_by: String,
}

impl Engine {
    pub fn new(
        store: Arc<dyn BulkChangeStore>,
        carriers: CarrierRegistry,
        continuations: Arc<dyn ContinuationSink>,
        summaries: Arc<dyn SummarySink>,
        worker: WorkerConfig,
        retries: RetryPolicies,
    ) -> Self {
        let processed_by = worker.processed_by.clone();
        let ctx = HandlerContext::new(store.clone(), Arc::new(retries), processed_by.clone());
        let router = build_router(&ctx, &carriers);
        let reconciler =
            JobStatusReconciler::new(store.clone(), summaries, processed_by.clone());

        Self {
            audit: AuditLogWriter::new(store.clone()),
            store,
            carriers,
            router,
            reconciler,
            continuations,
            worker,
            processed_by,
        }
    }

    /// Process one invocation for the job named by the queue message.
    ///
    /// Returns without side effects when another run is already active for
    /// the same job id.
    pub async fn run(&self, message: &ContinuationMessage) -> Result<RunOutcome> {
        let job_id = message.job_id;
        info!(
            job_id,
            retry_count = message.retry_count,
            request_id = %message.request_id,
            "starting bulk change run"
        );

        if self.store.active_run_count(job_id).await? > 0 {
            info!(job_id, "another run is active for this job, skipping");
            return Ok(RunOutcome::SkippedActiveRun);
        }

        self.store
            .register_active_run(job_id, &message.request_id)
            .await?;
        let outcome = self.run_guarded(message).await;
        if let Err(e) = self
            .store
            .clear_active_run(job_id, &message.request_id)
            .await
        {
            error!(job_id, error = %e, "failed to clear active run marker");
        }
        outcome
    }

    async fn run_guarded(&self, message: &ContinuationMessage) -> Result<RunOutcome> {
        let job_id = message.job_id;
        let job = self
            .store
            .load_job(job_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("bulk change {job_id}")))?;

        if job.status == JobStatus::New {
            self.store
                .update_job_status(job_id, JobStatus::Processing)
                .await?;
        }

        let records = self
            .store
            .load_unprocessed_records(job_id, self.worker.page_size)
            .await?;
        if records.is_empty() {
            debug!(job_id, "no unprocessed records remain");
            self.reconciler.reconcile(&job).await?;
            return Ok(RunOutcome::Completed);
        }

        info!(
            job_id,
            record_count = records.len(),
            integration = %job.integration,
            change_type = %job.change_type,
            "processing unprocessed records"
        );

        // Session credentials are resolved once per invocation and shared by
        // every record. A failure here is job-level: nothing was touched yet,
        // so the job stays Processing and is safe to re-attempt.
        let session = match self.carriers.get(job.integration) {
            Some(client) => {
                if !client.write_enabled() {
                    self.record_job_level_failure(
                        &records[0],
                        "carrier write operations are disabled for this service provider",
                    )
                    .await?;
                    return Ok(RunOutcome::Aborted(AbortReason::WritesDisabled));
                }
                match client.authenticate().await {
                    Ok(session) => session,
                    Err(cause) => {
                        warn!(job_id, error = %cause, "credential acquisition failed");
                        self.record_job_level_failure(
                            &records[0],
                            &format!("credential acquisition failed: {cause}"),
                        )
                        .await?;
                        return Ok(RunOutcome::Aborted(AbortReason::AuthenticationFailed));
                    }
                }
            }
            // No client configured: let each record fail closed at the router.
            None => CarrierSession::empty(),
        };

        let budget = TimeBudget::new(
            Duration::from_millis(self.worker.time_budget_ms),
            Duration::from_millis(self.worker.cutoff_ms),
        );
        for record in &records {
            if !budget.has_time_remaining() {
                info!(
                    job_id,
                    record_id = record.id,
                    "time budget below cutoff, deferring remaining records"
                );
                break;
            }
            self.process_record(&job, record, &session).await;
        }

        let reconciled = self.reconciler.reconcile(&job).await?;
        if reconciled.finalized {
            return Ok(RunOutcome::Completed);
        }

        if message.retry_count >= self.worker.max_retry_count {
            warn!(
                job_id,
                retry_count = message.retry_count,
                unprocessed = reconciled.counts.unprocessed(),
                "retry limit reached, leaving job in processing for operator follow-up"
            );
            return Ok(RunOutcome::Completed);
        }

        let continuation = message.next();
        self.continuations.enqueue(&continuation).await?;
        info!(
            job_id,
            unprocessed = reconciled.counts.unprocessed(),
            retry_count = continuation.retry_count,
            "continuation emitted for remaining records"
        );
        Ok(RunOutcome::Continued(continuation))
    }

    /// Process a single record, isolating any failure at this boundary: an
    /// error becomes a record-level Error plus an audit entry, and the loop
    /// moves on to the next record.
    async fn process_record(
        &self,
        job: &BulkChangeJob,
        record: &DeviceChangeRecord,
        session: &CarrierSession,
    ) {
        let result = match self.router.resolve(job.change_type, job.integration) {
            Ok(handler) => handler.process(job, record, session).await,
            Err(unsupported) => Err(unsupported),
        };

        match result {
            Ok(outcome) => {
                debug!(
                    record_id = record.id,
                    status = %outcome.status,
                    "record processed"
                );
            }
            Err(cause) => {
                warn!(record_id = record.id, error = %cause, "record failed");
                if let Err(write_err) = self.fail_record(record, &cause).await {
                    // The record stays unprocessed and will be retried by a
                    // later invocation.
                    error!(
                        record_id = record.id,
                        error = %write_err,
                        "failed to persist record error"
                    );
                }
            }
        }
    }

    async fn fail_record(&self, record: &DeviceChangeRecord, cause: &EngineError) -> Result<()> {
        let detail = cause.to_string();
        self.audit
            .append(AuditLogEntry::failure(
                record.id,
                "device change processing",
                record.change_request.clone(),
                detail.clone(),
            ))
            .await?;
        self.store
            .write_record_outcome(
                record.id,
                crate::core::types::RecordStatus::Error,
                true,
                &detail,
                &self.processed_by,
            )
            .await
    }

    /// One job-level audit entry, anchored to the first unprocessed record.
    /// No record is marked processed.
    async fn record_job_level_failure(
        &self,
        first_record: &DeviceChangeRecord,
        reason: &str,
    ) -> Result<()> {
        self.audit
            .append(AuditLogEntry::failure(
                first_record.id,
                "bulk change preflight",
                first_record.change_request.clone(),
                reason,
            ))
            .await
    }
}

fn build_router(ctx: &HandlerContext, carriers: &CarrierRegistry) -> IntegrationRouter {
    let mut router = IntegrationRouter::new();
    for client in carriers.clients() {
        let integration = client.integration();
        for change_type in client.supported_changes() {
            let handler: Arc<dyn ChangeHandler> = match change_type {
                ChangeType::StatusUpdate => {
                    Arc::new(StatusUpdateHandler::new(client.clone(), ctx.clone()))
                }
                ChangeType::IdentifierSwap => {
                    Arc::new(IdentifierSwapHandler::new(client.clone(), ctx.clone()))
                }
                ChangeType::CarrierRatePlan => {
                    Arc::new(CarrierRatePlanHandler::new(client.clone(), ctx.clone()))
                }
                ChangeType::CustomerRatePlan => {
                    Arc::new(CustomerRatePlanHandler::new(client.clone(), ctx.clone()))
                }
                ChangeType::UsernameUpdate => {
                    Arc::new(UsernameUpdateHandler::new(client.clone(), ctx.clone()))
                }
                ChangeType::CustomerAssociation => {
                    Arc::new(CustomerAssociationHandler::new(client.clone(), ctx.clone()))
                }
            };
            router.register(*change_type, integration, handler);
        }
    }
    router
}
