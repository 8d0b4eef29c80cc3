//! Queue boundary payloads and sink contracts
//!
//! The engine consumes and produces these payloads; queue transport semantics
//! belong to the hosting runtime.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::core::errors::Result;

/// Message that triggers (or resumes) processing of one bulk change job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationMessage {
    pub job_id: i64,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub is_retry_activation: bool,
    #[serde(default)]
    pub is_from_automated_trigger: bool,
    #[serde(default)]
    pub is_retry_identifier_update: bool,
}

impl ContinuationMessage {
    /// Fresh trigger for a job, as the creating layer would enqueue it.
    pub fn new(job_id: i64) -> Self {
        Self {
            job_id,
            retry_count: 0,
            request_id: Uuid::new_v4().to_string(),
            is_retry_activation: false,
            is_from_automated_trigger: false,
            is_retry_identifier_update: false,
        }
    }

    /// Follow-up message resuming the same job on its unprocessed tail.
    pub fn next(&self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self.clone()
        }
    }
}

/// Summary of a completed job, consumed by an external notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummaryEvent {
    pub job_id: i64,
    pub service_provider_id: i32,
    pub success_count: u64,
    pub failure_count: u64,
    pub completion_time: DateTime<Utc>,
}

/// Outbound side of the continuation queue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContinuationSink: Send + Sync {
    async fn enqueue(&self, message: &ContinuationMessage) -> Result<()>;
}

/// Outbound side of the completion notification channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SummarySink: Send + Sync {
    async fn publish(&self, event: &JobSummaryEvent) -> Result<()>;
}

/// Sink that records outbound payloads in the log only. Used by the binary
/// when no queue transport is wired in.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

#[async_trait]
impl ContinuationSink for LogSink {
    async fn enqueue(&self, message: &ContinuationMessage) -> Result<()> {
        info!(
            job_id = message.job_id,
            retry_count = message.retry_count,
            request_id = %message.request_id,
            "continuation emitted"
        );
        Ok(())
    }
}

#[async_trait]
impl SummarySink for LogSink {
    async fn publish(&self, event: &JobSummaryEvent) -> Result<()> {
        info!(
            job_id = event.job_id,
            success_count = event.success_count,
            failure_count = event.failure_count,
            "job summary emitted"
        );
        Ok(())
    }
}
