use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::types::Device;

/// Device inventory mirror database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "devices")]
pub struct Model {
    #[sea_orm(primary_key)]
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

    pub modified_by: Option<String>,

    pub modified_date: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn to_domain(&self) -> Device {
        Device {
            id: self.id,
            service_provider_id: self.service_provider_id,
            iccid: self.iccid.clone(),
            msisdn: self.msisdn.clone(),
            imei: self.imei.clone(),
            eid: self.eid.clone(),
            status: self.status.clone(),
            carrier_rate_plan: self.carrier_rate_plan.clone(),
            comm_plan: self.comm_plan.clone(),
            customer_rate_plan_id: self.customer_rate_plan_id,
            customer_pool_id: self.customer_pool_id,
            customer_data_allocation_mb: self.customer_data_allocation_mb,
            username: self.username.clone(),
            cost_center_1: self.cost_center_1.clone(),
            cost_center_2: self.cost_center_2.clone(),
            cost_center_3: self.cost_center_3.clone(),
            customer_ref: self.customer_ref.clone(),
            site_id: self.site_id,
        }
    }
}
