//! Store contract required by the engine
//!
//! The relational CRUD layer that creates jobs and renders results is
//! external; this trait is the slice of it the engine depends on. All status
//! transitions flow through these methods, so implementations must keep
//! `processed` monotonic and the unprocessed-record order stable across
//! invocations of the same job.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::audit::AuditLogEntry;
use crate::core::errors::Result;
use crate::core::types::{
    BulkChangeJob, CustomerRatePlanChange, Device, DeviceChangeRecord, DeviceIdentifier,
    IdentifierKind, JobStatus, RecordCounts, RecordStatus, UsernameUpdateChange,
};

/// Persistence operations backing the bulk change engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BulkChangeStore: Send + Sync {
    // ---- job header ----

    async fn load_job(&self, job_id: i64) -> Result<Option<BulkChangeJob>>;

    async fn update_job_status(&self, job_id: i64, status: JobStatus) -> Result<()>;

    /// Write the recomputed aggregate. `processed_by`/`processed_date` are
    /// passed only on the terminal transition.
    async fn write_job_aggregate<'a>(
        &self,
        job_id: i64,
        status: JobStatus,
        counts: &RecordCounts,
        processed_by: Option<&'a str>,
        processed_date: Option<DateTime<Utc>>,
    ) -> Result<()>;

    // ---- records ----

    /// Unprocessed records of a job in stable ascending-id order, bounded by
    /// `limit`. The order must be deterministic across invocations so a
    /// continuation resumes on exactly the untouched tail.
    async fn load_unprocessed_records(
        &self,
        job_id: i64,
        limit: u64,
    ) -> Result<Vec<DeviceChangeRecord>>;

    async fn record_counts(&self, job_id: i64) -> Result<RecordCounts>;

    /// Mark a record processed with its final status. Must be a no-op for
    /// records already processed.
    async fn write_record_outcome(
        &self,
        record_id: i64,
        status: RecordStatus,
        has_errors: bool,
        status_details: &str,
        processed_by: &str,
    ) -> Result<()>;

    // ---- audit ----

    async fn append_audit_entry(&self, entry: AuditLogEntry) -> Result<()>;

    // ---- single-active-run guard ----

    async fn active_run_count(&self, job_id: i64) -> Result<u64>;

    async fn register_active_run(&self, job_id: i64, request_id: &str) -> Result<()>;

    async fn clear_active_run(&self, job_id: i64, request_id: &str) -> Result<()>;

    // ---- device inventory mirror ----

    async fn find_device(
        &self,
        service_provider_id: i32,
        identifier: &DeviceIdentifier,
    ) -> Result<Option<Device>>;

    /// Whether an identifier value is already carried by a device other than
    /// `exclude_device_id` under the same service provider.
    async fn identifier_in_use(
        &self,
        service_provider_id: i32,
        identifier: &DeviceIdentifier,
        exclude_device_id: i64,
    ) -> Result<bool>;

    async fn update_device_status<'a>(
        &self,
        device_id: i64,
        status: &str,
        msisdn: Option<&'a str>,
        modified_by: &str,
    ) -> Result<()>;

    async fn update_device_identifier(
        &self,
        device_id: i64,
        kind: IdentifierKind,
        new_value: &str,
        modified_by: &str,
    ) -> Result<()>;

    async fn update_device_carrier_rate_plan<'a>(
        &self,
        device_id: i64,
        rate_plan: &str,
        comm_plan: Option<&'a str>,
        modified_by: &str,
    ) -> Result<()>;

    async fn update_device_customer_rate_plan(
        &self,
        device_id: i64,
        change: &CustomerRatePlanChange,
        modified_by: &str,
    ) -> Result<()>;

    async fn update_device_username(
        &self,
        device_id: i64,
        change: &UsernameUpdateChange,
        modified_by: &str,
    ) -> Result<()>;

    async fn assign_customer(
        &self,
        device_id: i64,
        customer_ref: &str,
        site_id: Option<i32>,
        modified_by: &str,
    ) -> Result<()>;
}
