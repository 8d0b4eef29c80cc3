//! Typed change payloads
//!
//! The opaque `change_request` text on a record decodes into this tagged
//! union; the `change_type` field is the explicit discriminator. Each variant
//! carries only the fields its handler needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::{EngineError, Result};
use crate::core::types::job::ChangeType;
use crate::core::types::record::IdentifierKind;

/// Tagged union of every change kind the engine processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change_type", rename_all = "snake_case")]
pub enum ChangeRequest {
    StatusUpdate(StatusUpdateChange),
    IdentifierSwap(IdentifierSwapChange),
    CarrierRatePlan(CarrierRatePlanChange),
    CustomerRatePlan(CustomerRatePlanChange),
    UsernameUpdate(UsernameUpdateChange),
    CustomerAssociation(CustomerAssociationChange),
}

impl ChangeRequest {
    /// Decode a raw payload; malformed payloads are a validation failure,
    /// terminal for the record.
    pub fn decode(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| EngineError::Validation(format!("malformed change request: {e}")))
    }

    pub fn change_type(&self) -> ChangeType {
        match self {
            ChangeRequest::StatusUpdate(_) => ChangeType::StatusUpdate,
            ChangeRequest::IdentifierSwap(_) => ChangeType::IdentifierSwap,
            ChangeRequest::CarrierRatePlan(_) => ChangeType::CarrierRatePlan,
            ChangeRequest::CustomerRatePlan(_) => ChangeType::CustomerRatePlan,
            ChangeRequest::UsernameUpdate(_) => ChangeType::UsernameUpdate,
            ChangeRequest::CustomerAssociation(_) => ChangeType::CustomerAssociation,
        }
    }
}

/// Device status change (activate, deactivate, suspend, restore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdateChange {
    pub target_status: String,
    #[serde(default)]
    pub ignore_current_status: bool,
    #[serde(default)]
    pub post_update_status_id: Option<i32>,
    #[serde(default)]
    pub account_number: Option<String>,
    /// Required when the target status is an activation.
    #[serde(default)]
    pub rate_plan_code: Option<String>,
}

impl StatusUpdateChange {
    /// Activation-type status changes need a rate plan on the carrier side.
    pub fn is_activation(&self) -> bool {
        self.target_status.eq_ignore_ascii_case("active")
            || self.target_status.eq_ignore_ascii_case("activate")
    }
}

/// ICCID or IMEI swap, optionally followed by a local customer rate plan
/// assignment once the swap succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifierSwapChange {
    pub identifier_type: IdentifierKind,
    #[serde(default)]
    pub old_iccid: Option<String>,
    #[serde(default)]
    pub new_iccid: Option<String>,
    #[serde(default)]
    pub old_imei: Option<String>,
    #[serde(default)]
    pub new_imei: Option<String>,
    #[serde(default)]
    pub customer_rate_plan: Option<CustomerRatePlanChange>,
}

impl IdentifierSwapChange {
    pub fn old_value(&self) -> Option<&str> {
        match self.identifier_type {
            IdentifierKind::Iccid => self.old_iccid.as_deref(),
            IdentifierKind::Imei => self.old_imei.as_deref(),
            _ => None,
        }
    }

    pub fn new_value(&self) -> Option<&str> {
        match self.identifier_type {
            IdentifierKind::Iccid => self.new_iccid.as_deref(),
            IdentifierKind::Imei => self.new_imei.as_deref(),
            _ => None,
        }
    }
}

/// Carrier-side rate plan change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierRatePlanChange {
    pub carrier_rate_plan: String,
    #[serde(default)]
    pub comm_plan: Option<String>,
    #[serde(default)]
    pub effective_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub plan_uuid: Option<String>,
    #[serde(default)]
    pub rate_plan_id: Option<i64>,
}

/// Customer-facing rate plan assignment; applied to the local mirror only,
/// no carrier call is involved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRatePlanChange {
    #[serde(default)]
    pub customer_rate_plan_id: Option<i32>,
    #[serde(default)]
    pub customer_data_allocation_mb: Option<f64>,
    #[serde(default)]
    pub customer_pool_id: Option<i32>,
    #[serde(default)]
    pub effective_date: Option<DateTime<Utc>>,
}

/// Username / cost center update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsernameUpdateChange {
    pub contact_name: String,
    #[serde(default)]
    pub cost_center_1: Option<String>,
    #[serde(default)]
    pub cost_center_2: Option<String>,
    #[serde(default)]
    pub cost_center_3: Option<String>,
}

/// Association of a device with a billing customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerAssociationChange {
    pub customer_ref: String,
    #[serde(default)]
    pub site_id: Option<i32>,
}
