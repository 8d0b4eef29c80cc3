//! Data factories for integration tests

use chrono::Utc;

use bulkchange_rs::core::types::{
    BulkChangeJob, ChangeType, Device, DeviceChangeRecord, DeviceIdentifier, Integration,
    JobStatus, RecordStatus,
};

/// Job factory.
pub struct JobFactory;

impl JobFactory {
    pub fn new_job(
        id: i64,
        integration: Integration,
        change_type: ChangeType,
        total: u32,
    ) -> BulkChangeJob {
        BulkChangeJob {
            id,
            tenant_id: 1,
            service_provider_id: 10,
            integration,
            change_type,
            status: JobStatus::New,
            total_count: total,
            processed_count: 0,
            error_count: 0,
            created_by: "portal-admin".to_string(),
            created_date: Utc::now(),
            processed_by: None,
            processed_date: None,
        }
    }
}

/// Record factory.
pub struct RecordFactory;

impl RecordFactory {
    pub fn with_payload(id: i64, job_id: i64, iccid: &str, payload: &str) -> DeviceChangeRecord {
        DeviceChangeRecord {
            id,
            bulk_change_id: job_id,
            identifier: DeviceIdentifier::iccid(iccid),
            msisdn: None,
            change_request: payload.to_string(),
            status: RecordStatus::New,
            has_errors: false,
            status_details: None,
            processed: false,
            processed_by: None,
            processed_date: None,
        }
    }

    pub fn status_update(id: i64, job_id: i64, iccid: &str, target: &str) -> DeviceChangeRecord {
        Self::with_payload(
            id,
            job_id,
            iccid,
            &format!(r#"{{"change_type":"status_update","target_status":"{target}"}}"#),
        )
    }

    pub fn activation(
        id: i64,
        job_id: i64,
        iccid: &str,
        rate_plan: &str,
    ) -> DeviceChangeRecord {
        Self::with_payload(
            id,
            job_id,
            iccid,
            &format!(
                r#"{{"change_type":"status_update","target_status":"active","rate_plan_code":"{rate_plan}"}}"#
            ),
        )
    }

    pub fn identifier_swap(
        id: i64,
        job_id: i64,
        old_iccid: &str,
        new_iccid: &str,
    ) -> DeviceChangeRecord {
        Self::with_payload(
            id,
            job_id,
            old_iccid,
            &format!(
                r#"{{"change_type":"identifier_swap","identifier_type":"iccid","old_iccid":"{old_iccid}","new_iccid":"{new_iccid}"}}"#
            ),
        )
    }

    pub fn username_update(id: i64, job_id: i64, iccid: &str, name: &str) -> DeviceChangeRecord {
        Self::with_payload(
            id,
            job_id,
            iccid,
            &format!(r#"{{"change_type":"username_update","contact_name":"{name}"}}"#),
        )
    }
}

/// Device factory.
pub struct DeviceFactory;

impl DeviceFactory {
    pub fn with_iccid(id: i64, iccid: &str, status: &str) -> Device {
        Device {
            id,
            service_provider_id: 10,
            iccid: Some(iccid.to_string()),
            msisdn: None,
            imei: None,
            eid: None,
            status: status.to_string(),
            carrier_rate_plan: None,
            comm_plan: None,
            customer_rate_plan_id: None,
            customer_pool_id: None,
            customer_data_allocation_mb: None,
            username: None,
            cost_center_1: None,
            cost_center_2: None,
            cost_center_3: None,
            customer_ref: None,
            site_id: None,
        }
    }
}
