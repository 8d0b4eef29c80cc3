use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::errors::EngineError;
use crate::core::types::{BulkChangeJob, ChangeType, Integration, JobStatus};

/// Bulk change job database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bulk_change_jobs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub tenant_id: i32,

    pub service_provider_id: i32,

    /// Integration name (jasper, thingspace, telegence)
    pub integration: String,

    /// Change kind discriminator
    pub change_type: String,

    /// Aggregate status (NEW, PROCESSING, PROCESSED, ERROR)
    pub status: String,

    pub total_count: i32,

    pub processed_count: i32,

    pub error_count: i32,

    pub created_by: String,

    pub created_date: DateTimeWithTimeZone,

    pub processed_by: Option<String>,

    pub processed_date: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn to_domain(&self) -> crate::core::errors::Result<BulkChangeJob> {
        Ok(BulkChangeJob {
            id: self.id,
            tenant_id: self.tenant_id,
            service_provider_id: self.service_provider_id,
            integration: Integration::parse(&self.integration).ok_or_else(|| {
                EngineError::Internal(format!("unknown integration {}", self.integration))
            })?,
            change_type: ChangeType::parse(&self.change_type).ok_or_else(|| {
                EngineError::Internal(format!("unknown change type {}", self.change_type))
            })?,
            status: JobStatus::parse(&self.status).ok_or_else(|| {
                EngineError::Internal(format!("unknown job status {}", self.status))
            })?,
            total_count: self.total_count.max(0) as u32,
            processed_count: self.processed_count.max(0) as u32,
            error_count: self.error_count.max(0) as u32,
            created_by: self.created_by.clone(),
            created_date: self.created_date.to_utc(),
            processed_by: self.processed_by.clone(),
            processed_date: self.processed_date.map(|d| d.to_utc()),
        })
    }
}
