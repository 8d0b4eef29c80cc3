//! Wall-clock time budget for a single engine invocation
//!
//! The guard is consulted only at record boundaries; an external call already
//! in flight is always allowed to finish. Running out of budget is not an
//! error, it is the signal to emit a continuation for the remaining tail.

use std::time::{Duration, Instant};

/// Remaining-time guard for the per-job processing loop.
#[derive(Debug, Clone)]
pub struct TimeBudget {
    started: Instant,
    total: Duration,
    cutoff: Duration,
}

impl TimeBudget {
    /// `total` is the wall-clock budget granted to this invocation; `cutoff`
    /// is the reserve below which no new record is started.
    pub fn new(total: Duration, cutoff: Duration) -> Self {
        Self {
            started: Instant::now(),
            total,
            cutoff,
        }
    }

    /// Wall-clock time left in this invocation.
    pub fn remaining(&self) -> Duration {
        self.total.saturating_sub(self.started.elapsed())
    }

    /// Whether the loop may start another record.
    pub fn has_time_remaining(&self) -> bool {
        self.remaining() > self.cutoff
    }
}
