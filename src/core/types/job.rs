//! Bulk change job header and its enumerations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate status of a bulk change job.
///
/// Transitions only `New -> Processing -> Processed`. Errors are recorded at
/// record granularity; `Error` is used when a job-level precondition itself
/// fails before any record is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    New,
    Processing,
    Processed,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::New => "NEW",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Processed => "PROCESSED",
            JobStatus::Error => "ERROR",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NEW" => Some(JobStatus::New),
            "PROCESSING" => Some(JobStatus::Processing),
            "PROCESSED" => Some(JobStatus::Processed),
            "ERROR" => Some(JobStatus::Error),
            _ => None,
        }
    }

    /// Terminal jobs are never revisited by the engine.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Processed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External carrier system a job targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integration {
    Jasper,
    ThingSpace,
    Telegence,
}

impl Integration {
    pub fn as_str(&self) -> &'static str {
        match self {
            Integration::Jasper => "jasper",
            Integration::ThingSpace => "thingspace",
            Integration::Telegence => "telegence",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "jasper" => Some(Integration::Jasper),
            "thingspace" => Some(Integration::ThingSpace),
            "telegence" => Some(Integration::Telegence),
            _ => None,
        }
    }
}

impl std::fmt::Display for Integration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of device change a job carries. One handler exists per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    StatusUpdate,
    IdentifierSwap,
    CarrierRatePlan,
    CustomerRatePlan,
    UsernameUpdate,
    CustomerAssociation,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::StatusUpdate => "status_update",
            ChangeType::IdentifierSwap => "identifier_swap",
            ChangeType::CarrierRatePlan => "carrier_rate_plan",
            ChangeType::CustomerRatePlan => "customer_rate_plan",
            ChangeType::UsernameUpdate => "username_update",
            ChangeType::CustomerAssociation => "customer_association",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "status_update" => Some(ChangeType::StatusUpdate),
            "identifier_swap" => Some(ChangeType::IdentifierSwap),
            "carrier_rate_plan" => Some(ChangeType::CarrierRatePlan),
            "customer_rate_plan" => Some(ChangeType::CustomerRatePlan),
            "username_update" => Some(ChangeType::UsernameUpdate),
            "customer_association" => Some(ChangeType::CustomerAssociation),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bulk change job header.
///
/// Created externally with its full record set; owned and mutated exclusively
/// by this engine until terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkChangeJob {
    pub id: i64,
    pub tenant_id: i32,
    pub service_provider_id: i32,
    pub integration: Integration,
    pub change_type: ChangeType,
    pub status: JobStatus,
    pub total_count: u32,
    pub processed_count: u32,
    pub error_count: u32,
    pub created_by: String,
    pub created_date: DateTime<Utc>,
    pub processed_by: Option<String>,
    pub processed_date: Option<DateTime<Utc>>,
}
