use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::audit::AuditLogEntry;

/// Audit log entry database model. Rows are append-only.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_log_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub record_id: i64,

    pub description: String,

    pub request_text: String,

    pub response_text: String,

    /// PROCESSED or ERROR
    pub response_status: String,

    pub has_errors: bool,

    pub logged_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn from_domain(entry: &AuditLogEntry) -> ActiveModel {
        use sea_orm::ActiveValue::Set;
        ActiveModel {
            id: Set(entry.id),
            record_id: Set(entry.record_id),
            description: Set(entry.description.clone()),
            request_text: Set(entry.request_text.clone()),
            response_text: Set(entry.response_text.clone()),
            response_status: Set(entry.response_status.clone()),
            has_errors: Set(entry.has_errors),
            logged_at: Set(entry.logged_at.into()),
        }
    }
}
