//! Device change records and the device inventory mirror

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of device identifier a record is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    Iccid,
    Msisdn,
    Imei,
    Eid,
}

impl IdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Iccid => "iccid",
            IdentifierKind::Msisdn => "msisdn",
            IdentifierKind::Imei => "imei",
            IdentifierKind::Eid => "eid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "iccid" => Some(IdentifierKind::Iccid),
            "msisdn" => Some(IdentifierKind::Msisdn),
            "imei" => Some(IdentifierKind::Imei),
            "eid" => Some(IdentifierKind::Eid),
            _ => None,
        }
    }
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed device identifier (kind + value).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentifier {
    pub kind: IdentifierKind,
    pub value: String,
}

impl DeviceIdentifier {
    pub fn iccid(value: impl Into<String>) -> Self {
        Self {
            kind: IdentifierKind::Iccid,
            value: value.into(),
        }
    }

    pub fn msisdn(value: impl Into<String>) -> Self {
        Self {
            kind: IdentifierKind::Msisdn,
            value: value.into(),
        }
    }

    pub fn imei(value: impl Into<String>) -> Self {
        Self {
            kind: IdentifierKind::Imei,
            value: value.into(),
        }
    }

    pub fn eid(value: impl Into<String>) -> Self {
        Self {
            kind: IdentifierKind::Eid,
            value: value.into(),
        }
    }
}

impl std::fmt::Display for DeviceIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

/// Processing status of one device change record.
///
/// `New -> Processing -> {Processed, Error}`; `Error` is terminal with
/// `processed = true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    New,
    Processing,
    Processed,
    Error,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::New => "NEW",
            RecordStatus::Processing => "PROCESSING",
            RecordStatus::Processed => "PROCESSED",
            RecordStatus::Error => "ERROR",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NEW" => Some(RecordStatus::New),
            "PROCESSING" => Some(RecordStatus::Processing),
            "PROCESSED" => Some(RecordStatus::Processed),
            "ERROR" => Some(RecordStatus::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One device's individual change request within a job.
///
/// `processed` is monotonic: once true the record is never revisited by a
/// later invocation. Mutated only by a change handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceChangeRecord {
    pub id: i64,
    pub bulk_change_id: i64,
    pub identifier: DeviceIdentifier,
    /// Sibling MSISDN carried alongside the primary identifier when known.
    pub msisdn: Option<String>,
    /// Opaque change payload; decoded by the handler into a typed structure.
    pub change_request: String,
    pub status: RecordStatus,
    pub has_errors: bool,
    pub status_details: Option<String>,
    pub processed: bool,
    pub processed_by: Option<String>,
    pub processed_date: Option<DateTime<Utc>>,
}

/// Local inventory mirror of a device, mutated by handlers after a
/// successful carrier operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub service_provider_id: i32,
    pub iccid: Option<String>,
    pub msisdn: Option<String>,
    pub imei: Option<String>,
    pub eid: Option<String>,
    pub status: String,
    pub carrier_rate_plan: Option<String>,
    pub comm_plan: Option<String>,
    pub customer_rate_plan_id: Option<i32>,
    pub customer_pool_id: Option<i32>,
    pub customer_data_allocation_mb: Option<f64>,
    pub username: Option<String>,
    pub cost_center_1: Option<String>,
    pub cost_center_2: Option<String>,
    pub cost_center_3: Option<String>,
    pub customer_ref: Option<String>,
    pub site_id: Option<i32>,
}

impl Device {
    /// Value of the given identifier kind on this device, when present.
    pub fn identifier_value(&self, kind: IdentifierKind) -> Option<&str> {
        match kind {
            IdentifierKind::Iccid => self.iccid.as_deref(),
            IdentifierKind::Msisdn => self.msisdn.as_deref(),
            IdentifierKind::Imei => self.imei.as_deref(),
            IdentifierKind::Eid => self.eid.as_deref(),
        }
    }
}
