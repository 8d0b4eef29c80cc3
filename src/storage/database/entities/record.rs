use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::errors::EngineError;
use crate::core::types::{DeviceChangeRecord, DeviceIdentifier, IdentifierKind, RecordStatus};

/// Device change record database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "device_change_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub bulk_change_id: i64,

    /// Identifier kind the record is keyed by (iccid, msisdn, imei, eid)
    pub identifier_kind: String,

    pub identifier_value: String,

    pub msisdn: Option<String>,

    /// Opaque change payload, decoded by the handler
    pub change_request: String,

    pub status: String,

    pub has_errors: bool,

    pub status_details: Option<String>,

    pub processed: bool,

    pub processed_by: Option<String>,

    pub processed_date: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn to_domain(&self) -> crate::core::errors::Result<DeviceChangeRecord> {
        Ok(DeviceChangeRecord {
            id: self.id,
            bulk_change_id: self.bulk_change_id,
            identifier: DeviceIdentifier {
                kind: IdentifierKind::parse(&self.identifier_kind).ok_or_else(|| {
                    EngineError::Internal(format!(
                        "unknown identifier kind {}",
                        self.identifier_kind
                    ))
                })?,
                value: self.identifier_value.clone(),
            },
            msisdn: self.msisdn.clone(),
            change_request: self.change_request.clone(),
            status: RecordStatus::parse(&self.status).ok_or_else(|| {
                EngineError::Internal(format!("unknown record status {}", self.status))
            })?,
            has_errors: self.has_errors,
            status_details: self.status_details.clone(),
            processed: self.processed,
            processed_by: self.processed_by.clone(),
            processed_date: self.processed_date.map(|d| d.to_utc()),
        })
    }
}
