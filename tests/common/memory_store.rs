//! In-memory store implementation for integration tests

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use bulkchange_rs::core::audit::AuditLogEntry;
use bulkchange_rs::core::errors::{EngineError, Result};
use bulkchange_rs::core::types::{
    BulkChangeJob, CustomerRatePlanChange, Device, DeviceChangeRecord, DeviceIdentifier,
    IdentifierKind, JobStatus, RecordCounts, RecordStatus, UsernameUpdateChange,
};
use bulkchange_rs::storage::BulkChangeStore;

#[derive(Default)]
struct Inner {
    jobs: HashMap<i64, BulkChangeJob>,
    records: BTreeMap<i64, DeviceChangeRecord>,
    devices: HashMap<i64, Device>,
    audit: Vec<AuditLogEntry>,
    active_runs: Vec<(i64, String)>,
}

/// Full copy of the store state, for byte-for-byte comparisons.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    pub jobs: Vec<BulkChangeJob>,
    pub records: Vec<DeviceChangeRecord>,
    pub devices: Vec<Device>,
    pub audit: Vec<AuditLogEntry>,
    pub active_runs: Vec<(i64, String)>,
}

/// Store keeping everything in process memory.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_job(&self, job: BulkChangeJob) {
        self.inner.write().await.jobs.insert(job.id, job);
    }

    pub async fn insert_record(&self, record: DeviceChangeRecord) {
        self.inner.write().await.records.insert(record.id, record);
    }

    pub async fn insert_device(&self, device: Device) {
        self.inner.write().await.devices.insert(device.id, device);
    }

    pub async fn job(&self, job_id: i64) -> BulkChangeJob {
        self.inner.read().await.jobs[&job_id].clone()
    }

    pub async fn record(&self, record_id: i64) -> DeviceChangeRecord {
        self.inner.read().await.records[&record_id].clone()
    }

    pub async fn device(&self, device_id: i64) -> Device {
        self.inner.read().await.devices[&device_id].clone()
    }

    pub async fn audit_entries_for(&self, record_id: i64) -> Vec<AuditLogEntry> {
        self.inner
            .read()
            .await
            .audit
            .iter()
            .filter(|entry| entry.record_id == record_id)
            .cloned()
            .collect()
    }

    pub async fn audit_entry_count(&self) -> usize {
        self.inner.read().await.audit.len()
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let inner = self.inner.read().await;
        let mut jobs: Vec<_> = inner.jobs.values().cloned().collect();
        jobs.sort_by_key(|job| job.id);
        let mut devices: Vec<_> = inner.devices.values().cloned().collect();
        devices.sort_by_key(|device| device.id);
        StoreSnapshot {
            jobs,
            records: inner.records.values().cloned().collect(),
            devices,
            audit: inner.audit.clone(),
            active_runs: inner.active_runs.clone(),
        }
    }
}

#[async_trait]
impl BulkChangeStore for InMemoryStore {
    async fn load_job(&self, job_id: i64) -> Result<Option<BulkChangeJob>> {
        Ok(self.inner.read().await.jobs.get(&job_id).cloned())
    }

    async fn update_job_status(&self, job_id: i64, status: JobStatus) -> Result<()> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| EngineError::NotFound(format!("bulk change {job_id}")))?;
        job.status = status;
        Ok(())
    }

    async fn write_job_aggregate<'a>(
        &self,
        job_id: i64,
        status: JobStatus,
        counts: &RecordCounts,
        processed_by: Option<&'a str>,
        processed_date: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| EngineError::NotFound(format!("bulk change {job_id}")))?;
        job.status = status;
        job.processed_count = counts.processed as u32;
        job.error_count = counts.errored as u32;
        if let Some(processed_by) = processed_by {
            job.processed_by = Some(processed_by.to_string());
        }
        if let Some(processed_date) = processed_date {
            job.processed_date = Some(processed_date);
        }
        Ok(())
    }

    async fn load_unprocessed_records(
        &self,
        job_id: i64,
        limit: u64,
    ) -> Result<Vec<DeviceChangeRecord>> {
        Ok(self
            .inner
            .read()
            .await
            .records
            .values()
            .filter(|record| record.bulk_change_id == job_id && !record.processed)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn record_counts(&self, job_id: i64) -> Result<RecordCounts> {
        let inner = self.inner.read().await;
        let mut counts = RecordCounts::default();
        for record in inner.records.values() {
            if record.bulk_change_id != job_id {
                continue;
            }
            counts.total += 1;
            if record.processed {
                counts.processed += 1;
                if record.has_errors {
                    counts.errored += 1;
                }
            }
        }
        Ok(counts)
    }

    async fn write_record_outcome(
        &self,
        record_id: i64,
        status: RecordStatus,
        has_errors: bool,
        status_details: &str,
        processed_by: &str,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let record = inner
            .records
            .get_mut(&record_id)
            .ok_or_else(|| EngineError::NotFound(format!("device change record {record_id}")))?;
        if record.processed {
            return Ok(());
        }
        record.status = status;
        record.has_errors = has_errors;
        record.status_details = Some(status_details.to_string());
        record.processed = true;
        record.processed_by = Some(processed_by.to_string());
        record.processed_date = Some(Utc::now());
        Ok(())
    }

    async fn append_audit_entry(&self, entry: AuditLogEntry) -> Result<()> {
        self.inner.write().await.audit.push(entry);
        Ok(())
    }

    async fn active_run_count(&self, job_id: i64) -> Result<u64> {
        Ok(self
            .inner
            .read()
            .await
            .active_runs
            .iter()
            .filter(|(id, _)| *id == job_id)
            .count() as u64)
    }

    async fn register_active_run(&self, job_id: i64, request_id: &str) -> Result<()> {
        self.inner
            .write()
            .await
            .active_runs
            .push((job_id, request_id.to_string()));
        Ok(())
    }

    async fn clear_active_run(&self, job_id: i64, request_id: &str) -> Result<()> {
        self.inner
            .write()
            .await
            .active_runs
            .retain(|(id, request)| !(*id == job_id && request == request_id));
        Ok(())
    }

    async fn find_device(
        &self,
        service_provider_id: i32,
        identifier: &DeviceIdentifier,
    ) -> Result<Option<Device>> {
        Ok(self
            .inner
            .read()
            .await
            .devices
            .values()
            .find(|device| {
                device.service_provider_id == service_provider_id
                    && device.identifier_value(identifier.kind) == Some(identifier.value.as_str())
            })
            .cloned())
    }

    async fn identifier_in_use(
        &self,
        service_provider_id: i32,
        identifier: &DeviceIdentifier,
        exclude_device_id: i64,
    ) -> Result<bool> {
        Ok(self.inner.read().await.devices.values().any(|device| {
            device.id != exclude_device_id
                && device.service_provider_id == service_provider_id
                && device.identifier_value(identifier.kind) == Some(identifier.value.as_str())
        }))
    }

    async fn update_device_status<'a>(
        &self,
        device_id: i64,
        status: &str,
        msisdn: Option<&'a str>,
        _modified_by: &str,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let device = inner
            .devices
            .get_mut(&device_id)
            .ok_or_else(|| EngineError::NotFound(format!("device {device_id}")))?;
        device.status = status.to_string();
        if let Some(msisdn) = msisdn {
            device.msisdn = Some(msisdn.to_string());
        }
        Ok(())
    }

    async fn update_device_identifier(
        &self,
        device_id: i64,
        kind: IdentifierKind,
        new_value: &str,
        _modified_by: &str,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let device = inner
            .devices
            .get_mut(&device_id)
            .ok_or_else(|| EngineError::NotFound(format!("device {device_id}")))?;
        match kind {
            IdentifierKind::Iccid => device.iccid = Some(new_value.to_string()),
            IdentifierKind::Msisdn => device.msisdn = Some(new_value.to_string()),
            IdentifierKind::Imei => device.imei = Some(new_value.to_string()),
            IdentifierKind::Eid => device.eid = Some(new_value.to_string()),
        }
        Ok(())
    }

    async fn update_device_carrier_rate_plan<'a>(
        &self,
        device_id: i64,
        rate_plan: &str,
        comm_plan: Option<&'a str>,
        _modified_by: &str,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let device = inner
            .devices
            .get_mut(&device_id)
            .ok_or_else(|| EngineError::NotFound(format!("device {device_id}")))?;
        device.carrier_rate_plan = Some(rate_plan.to_string());
        if let Some(comm_plan) = comm_plan {
            device.comm_plan = Some(comm_plan.to_string());
        }
        Ok(())
    }

    async fn update_device_customer_rate_plan(
        &self,
        device_id: i64,
        change: &CustomerRatePlanChange,
        _modified_by: &str,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let device = inner
            .devices
            .get_mut(&device_id)
            .ok_or_else(|| EngineError::NotFound(format!("device {device_id}")))?;
        if change.customer_rate_plan_id.is_some() {
            device.customer_rate_plan_id = change.customer_rate_plan_id;
        }
        if change.customer_pool_id.is_some() {
            device.customer_pool_id = change.customer_pool_id;
        }
        if change.customer_data_allocation_mb.is_some() {
            device.customer_data_allocation_mb = change.customer_data_allocation_mb;
        }
        Ok(())
    }

    async fn update_device_username(
        &self,
        device_id: i64,
        change: &UsernameUpdateChange,
        _modified_by: &str,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let device = inner
            .devices
            .get_mut(&device_id)
            .ok_or_else(|| EngineError::NotFound(format!("device {device_id}")))?;
        device.username = Some(change.contact_name.clone());
        device.cost_center_1 = change.cost_center_1.clone();
        device.cost_center_2 = change.cost_center_2.clone();
        device.cost_center_3 = change.cost_center_3.clone();
        Ok(())
    }

    async fn assign_customer(
        &self,
        device_id: i64,
        customer_ref: &str,
        site_id: Option<i32>,
        _modified_by: &str,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let device = inner
            .devices
            .get_mut(&device_id)
            .ok_or_else(|| EngineError::NotFound(format!("device {device_id}")))?;
        device.customer_ref = Some(customer_ref.to_string());
        if site_id.is_some() {
            device.site_id = site_id;
        }
        Ok(())
    }
}
