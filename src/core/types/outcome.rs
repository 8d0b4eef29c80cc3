//! Run and record outcomes

use crate::core::types::record::RecordStatus;
use crate::queue::ContinuationMessage;
use serde::{Deserialize, Serialize};

/// Why a run aborted at job level without touching any record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// Credential/session acquisition failed for the integration.
    AuthenticationFailed,
    /// Carrier write operations are disabled for the service provider.
    WritesDisabled,
}

/// Outcome of one engine invocation, consumed by the hosting runtime to
/// decide message acknowledgment or retry scheduling.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every record of the job is processed; the job is terminal.
    Completed,
    /// A tail of unprocessed records remains; the given continuation was
    /// emitted for a future invocation.
    Continued(ContinuationMessage),
    /// Another run is active for this job id; nothing was done.
    SkippedActiveRun,
    /// Job-level precondition failed before the loop; the job stays
    /// Processing and is safe to re-attempt.
    Aborted(AbortReason),
}

impl RunOutcome {
    /// Whether the hosting runtime should acknowledge the triggering message.
    pub fn is_success(&self) -> bool {
        !matches!(self, RunOutcome::Aborted(_))
    }
}

/// Aggregate record counters for a job, recomputed from the record set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCounts {
    pub total: u64,
    pub processed: u64,
    pub errored: u64,
}

impl RecordCounts {
    pub fn unprocessed(&self) -> u64 {
        self.total.saturating_sub(self.processed)
    }

    pub fn succeeded(&self) -> u64 {
        self.processed.saturating_sub(self.errored)
    }

    pub fn all_processed(&self) -> bool {
        self.processed >= self.total
    }
}

/// Result of processing a single record, reported by a change handler.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub record_id: i64,
    pub status: RecordStatus,
    pub has_errors: bool,
    pub detail: String,
}

impl RecordOutcome {
    pub fn processed(record_id: i64, detail: impl Into<String>) -> Self {
        Self {
            record_id,
            status: RecordStatus::Processed,
            has_errors: false,
            detail: detail.into(),
        }
    }

    pub fn errored(record_id: i64, detail: impl Into<String>) -> Self {
        Self {
            record_id,
            status: RecordStatus::Error,
            has_errors: true,
            detail: detail.into(),
        }
    }
}
