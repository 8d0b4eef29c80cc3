//! Job status reconciler
//!
//! Recomputes the aggregate counters from the record set after every
//! invocation. A job whose records are all processed becomes Processed
//! regardless of how many of them errored; per-record failures stay visible
//! through the counters and individual record statuses, they never block job
//! completion. A job that is already terminal is left untouched.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::core::errors::Result;
use crate::core::types::{BulkChangeJob, JobStatus, RecordCounts};
use crate::queue::{JobSummaryEvent, SummarySink};
use crate::storage::BulkChangeStore;

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileResult {
    pub counts: RecordCounts,
    /// True when the job reached (or already was in) its terminal state.
    pub finalized: bool,
}

/// Recomputes and persists job aggregates, emitting the completion summary
/// on the terminal transition.
pub struct JobStatusReconciler {
    store: Arc<dyn BulkChangeStore>,
    summaries: Arc<dyn SummarySink>,
    processed_by: String,
}

impl JobStatusReconciler {
    pub fn new(
        store: Arc<dyn BulkChangeStore>,
        summaries: Arc<dyn SummarySink>,
        processed_by: impl Into<String>,
    ) -> Self {
        Self {
            store,
            summaries,
            processed_by: processed_by.into(),
        }
    }

    pub async fn reconcile(&self, job: &BulkChangeJob) -> Result<ReconcileResult> {
        let counts = self.store.record_counts(job.id).await?;

        if !counts.all_processed() {
            self.store
                .write_job_aggregate(job.id, JobStatus::Processing, &counts, None, None)
                .await?;
            return Ok(ReconcileResult {
                counts,
                finalized: false,
            });
        }

        if job.status.is_terminal() {
            // Already finalized by an earlier invocation; leave every field
            // untouched so re-delivered messages are free of side effects.
            return Ok(ReconcileResult {
                counts,
                finalized: true,
            });
        }

        let completion_time = Utc::now();
        self.store
            .write_job_aggregate(
                job.id,
                JobStatus::Processed,
                &counts,
                Some(&self.processed_by),
                Some(completion_time),
            )
            .await?;

        info!(
            job_id = job.id,
            processed = counts.processed,
            errored = counts.errored,
            "bulk change finalized"
        );

        self.summaries
            .publish(&JobSummaryEvent {
                job_id: job.id,
                service_provider_id: job.service_provider_id,
                success_count: counts.succeeded(),
                failure_count: counts.errored,
                completion_time,
            })
            .await?;

        Ok(ReconcileResult {
            counts,
            finalized: true,
        })
    }
}
