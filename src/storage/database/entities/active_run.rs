use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Active-run marker backing the single-active-run guard. One row per
/// in-flight invocation of a job.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "active_runs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub job_id: i64,

    pub request_id: String,

    pub started_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
