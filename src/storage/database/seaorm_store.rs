//! SeaORM-backed implementation of the store contract

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info, warn};

use super::entities::{self, active_run, audit, device, job, record};
use super::migration::Migrator;
use crate::config::DatabaseConfig;
use crate::core::audit::AuditLogEntry;
use crate::core::errors::{EngineError, Result};
use crate::core::types::{
    BulkChangeJob, CustomerRatePlanChange, Device, DeviceChangeRecord, DeviceIdentifier,
    IdentifierKind, JobStatus, RecordCounts, RecordStatus, UsernameUpdateChange,
};
use crate::storage::BulkChangeStore;

/// SeaORM-based store implementation
#[derive(Debug)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    /// Create a new database connection
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let mut opt = ConnectOptions::new(config.url.clone());
        opt.max_connections(config.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.connection_timeout))
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(3600))
            .sqlx_logging(true)
            .sqlx_logging_level(log::LevelFilter::Debug);

        let db = Database::connect(opt)
            .await
            .map_err(EngineError::Database)?;

        info!("Database connection established");
        Ok(Self { db })
    }

    /// Wrap an existing connection (tests, embedded use).
    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Underlying connection, for callers that seed or inspect tables
    /// directly.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");
        Migrator::up(&self.db, None).await.map_err(|e| {
            warn!("Migration failed: {}", e);
            EngineError::Database(e)
        })?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    fn identifier_column(kind: IdentifierKind) -> device::Column {
        match kind {
            IdentifierKind::Iccid => device::Column::Iccid,
            IdentifierKind::Msisdn => device::Column::Msisdn,
            IdentifierKind::Imei => device::Column::Imei,
            IdentifierKind::Eid => device::Column::Eid,
        }
    }

    async fn device_active_model(&self, device_id: i64) -> Result<device::ActiveModel> {
        let model = entities::DeviceRow::find_by_id(device_id)
            .one(&self.db)
            .await
            .map_err(EngineError::Database)?
            .ok_or_else(|| EngineError::NotFound(format!("device {device_id}")))?;
        Ok(model.into())
    }

    fn stamp(model: &mut device::ActiveModel, modified_by: &str) {
        model.modified_by = Set(Some(modified_by.to_string()));
        model.modified_date = Set(Some(Utc::now().into()));
    }
}

#[async_trait]
impl BulkChangeStore for SeaOrmStore {
    async fn load_job(&self, job_id: i64) -> Result<Option<BulkChangeJob>> {
        debug!(job_id, "loading bulk change job");
        let model = entities::Job::find_by_id(job_id)
            .one(&self.db)
            .await
            .map_err(EngineError::Database)?;
        model.map(|m| m.to_domain()).transpose()
    }

    async fn update_job_status(&self, job_id: i64, status: JobStatus) -> Result<()> {
        let model = entities::Job::find_by_id(job_id)
            .one(&self.db)
            .await
            .map_err(EngineError::Database)?
            .ok_or_else(|| EngineError::NotFound(format!("bulk change {job_id}")))?;

        let mut active: job::ActiveModel = model.into();
        active.status = Set(status.as_str().to_string());
        active.update(&self.db).await.map_err(EngineError::Database)?;
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
        let model = entities::Job::find_by_id(job_id)
            .one(&self.db)
            .await
            .map_err(EngineError::Database)?
            .ok_or_else(|| EngineError::NotFound(format!("bulk change {job_id}")))?;

        let mut active: job::ActiveModel = model.into();
        active.status = Set(status.as_str().to_string());
        active.processed_count = Set(counts.processed as i32);
        active.error_count = Set(counts.errored as i32);
        if let Some(processed_by) = processed_by {
            active.processed_by = Set(Some(processed_by.to_string()));
        }
        if let Some(processed_date) = processed_date {
            active.processed_date = Set(Some(processed_date.into()));
        }
        active.update(&self.db).await.map_err(EngineError::Database)?;
        Ok(())
    }

    async fn load_unprocessed_records(
        &self,
        job_id: i64,
        limit: u64,
    ) -> Result<Vec<DeviceChangeRecord>> {
        let models = entities::Record::find()
            .filter(record::Column::BulkChangeId.eq(job_id))
            .filter(record::Column::Processed.eq(false))
            .order_by_asc(record::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(EngineError::Database)?;

        models.iter().map(|m| m.to_domain()).collect()
    }

    async fn record_counts(&self, job_id: i64) -> Result<RecordCounts> {
        let total = entities::Record::find()
            .filter(record::Column::BulkChangeId.eq(job_id))
            .count(&self.db)
            .await
            .map_err(EngineError::Database)?;
        let processed = entities::Record::find()
            .filter(record::Column::BulkChangeId.eq(job_id))
            .filter(record::Column::Processed.eq(true))
            .count(&self.db)
            .await
            .map_err(EngineError::Database)?;
        let errored = entities::Record::find()
            .filter(record::Column::BulkChangeId.eq(job_id))
            .filter(record::Column::Processed.eq(true))
            .filter(record::Column::HasErrors.eq(true))
            .count(&self.db)
            .await
            .map_err(EngineError::Database)?;

        Ok(RecordCounts {
            total,
            processed,
            errored,
        })
    }

    async fn write_record_outcome(
        &self,
        record_id: i64,
        status: RecordStatus,
        has_errors: bool,
        status_details: &str,
        processed_by: &str,
    ) -> Result<()> {
        let model = entities::Record::find_by_id(record_id)
            .one(&self.db)
            .await
            .map_err(EngineError::Database)?
            .ok_or_else(|| EngineError::NotFound(format!("device change record {record_id}")))?;

        // processed is monotonic; a record marked by an earlier invocation is
        // never rewritten
        if model.processed {
            debug!(record_id, "record already processed, skipping outcome write");
            return Ok(());
        }

        let mut active: record::ActiveModel = model.into();
        active.status = Set(status.as_str().to_string());
        active.has_errors = Set(has_errors);
        active.status_details = Set(Some(status_details.to_string()));
        active.processed = Set(true);
        active.processed_by = Set(Some(processed_by.to_string()));
        active.processed_date = Set(Some(Utc::now().into()));
        active.update(&self.db).await.map_err(EngineError::Database)?;
        Ok(())
    }

    async fn append_audit_entry(&self, entry: AuditLogEntry) -> Result<()> {
        let active = audit::Model::from_domain(&entry);
        entities::AuditEntry::insert(active)
            .exec(&self.db)
            .await
            .map_err(EngineError::Database)?;
        Ok(())
    }

    async fn active_run_count(&self, job_id: i64) -> Result<u64> {
        entities::ActiveRun::find()
            .filter(active_run::Column::JobId.eq(job_id))
            .count(&self.db)
            .await
            .map_err(EngineError::Database)
    }

    async fn register_active_run(&self, job_id: i64, request_id: &str) -> Result<()> {
        let active = active_run::ActiveModel {
            id: NotSet,
            job_id: Set(job_id),
            request_id: Set(request_id.to_string()),
            started_at: Set(Utc::now().into()),
        };
        entities::ActiveRun::insert(active)
            .exec(&self.db)
            .await
            .map_err(EngineError::Database)?;
        Ok(())
    }

    async fn clear_active_run(&self, job_id: i64, request_id: &str) -> Result<()> {
        entities::ActiveRun::delete_many()
            .filter(active_run::Column::JobId.eq(job_id))
            .filter(active_run::Column::RequestId.eq(request_id))
            .exec(&self.db)
            .await
            .map_err(EngineError::Database)?;
        Ok(())
    }

    async fn find_device(
        &self,
        service_provider_id: i32,
        identifier: &DeviceIdentifier,
    ) -> Result<Option<Device>> {
        let column = Self::identifier_column(identifier.kind);
        let model = entities::DeviceRow::find()
            .filter(device::Column::ServiceProviderId.eq(service_provider_id))
            .filter(column.eq(identifier.value.as_str()))
            .one(&self.db)
            .await
            .map_err(EngineError::Database)?;
        Ok(model.map(|m| m.to_domain()))
    }

    async fn identifier_in_use(
        &self,
        service_provider_id: i32,
        identifier: &DeviceIdentifier,
        exclude_device_id: i64,
    ) -> Result<bool> {
        let column = Self::identifier_column(identifier.kind);
        let count = entities::DeviceRow::find()
            .filter(device::Column::ServiceProviderId.eq(service_provider_id))
            .filter(column.eq(identifier.value.as_str()))
            .filter(device::Column::Id.ne(exclude_device_id))
            .count(&self.db)
            .await
            .map_err(EngineError::Database)?;
        Ok(count > 0)
    }

    async fn update_device_status<'a>(
        &self,
        device_id: i64,
        status: &str,
        msisdn: Option<&'a str>,
        modified_by: &str,
    ) -> Result<()> {
        let mut active = self.device_active_model(device_id).await?;
        active.status = Set(status.to_string());
        if let Some(msisdn) = msisdn {
            active.msisdn = Set(Some(msisdn.to_string()));
        }
        Self::stamp(&mut active, modified_by);
        active.update(&self.db).await.map_err(EngineError::Database)?;
        Ok(())
    }

    async fn update_device_identifier(
        &self,
        device_id: i64,
        kind: IdentifierKind,
        new_value: &str,
        modified_by: &str,
    ) -> Result<()> {
        let mut active = self.device_active_model(device_id).await?;
        match kind {
            IdentifierKind::Iccid => active.iccid = Set(Some(new_value.to_string())),
            IdentifierKind::Msisdn => active.msisdn = Set(Some(new_value.to_string())),
            IdentifierKind::Imei => active.imei = Set(Some(new_value.to_string())),
            IdentifierKind::Eid => active.eid = Set(Some(new_value.to_string())),
        }
        Self::stamp(&mut active, modified_by);
        active.update(&self.db).await.map_err(EngineError::Database)?;
        Ok(())
    }

    async fn update_device_carrier_rate_plan<'a>(
        &self,
        device_id: i64,
        rate_plan: &str,
        comm_plan: Option<&'a str>,
        modified_by: &str,
    ) -> Result<()> {
        let mut active = self.device_active_model(device_id).await?;
        active.carrier_rate_plan = Set(Some(rate_plan.to_string()));
        if let Some(comm_plan) = comm_plan {
            active.comm_plan = Set(Some(comm_plan.to_string()));
        }
        Self::stamp(&mut active, modified_by);
        active.update(&self.db).await.map_err(EngineError::Database)?;
        Ok(())
    }

    async fn update_device_customer_rate_plan(
        &self,
        device_id: i64,
        change: &CustomerRatePlanChange,
        modified_by: &str,
    ) -> Result<()> {
        let mut active = self.device_active_model(device_id).await?;
        if change.customer_rate_plan_id.is_some() {
            active.customer_rate_plan_id = Set(change.customer_rate_plan_id);
        }
        if change.customer_pool_id.is_some() {
            active.customer_pool_id = Set(change.customer_pool_id);
        }
        if change.customer_data_allocation_mb.is_some() {
            active.customer_data_allocation_mb = Set(change.customer_data_allocation_mb);
        }
        Self::stamp(&mut active, modified_by);
        active.update(&self.db).await.map_err(EngineError::Database)?;
        Ok(())
    }

    async fn update_device_username(
        &self,
        device_id: i64,
        change: &UsernameUpdateChange,
        modified_by: &str,
    ) -> Result<()> {
        let mut active = self.device_active_model(device_id).await?;
        active.username = Set(Some(change.contact_name.clone()));
        active.cost_center_1 = Set(change.cost_center_1.clone());
        active.cost_center_2 = Set(change.cost_center_2.clone());
        active.cost_center_3 = Set(change.cost_center_3.clone());
        Self::stamp(&mut active, modified_by);
        active.update(&self.db).await.map_err(EngineError::Database)?;
        Ok(())
    }

    async fn assign_customer(
        &self,
        device_id: i64,
        customer_ref: &str,
        site_id: Option<i32>,
        modified_by: &str,
    ) -> Result<()> {
        let mut active = self.device_active_model(device_id).await?;
        active.customer_ref = Set(Some(customer_ref.to_string()));
        if site_id.is_some() {
            active.site_id = Set(site_id);
        }
        Self::stamp(&mut active, modified_by);
        active.update(&self.db).await.map_err(EngineError::Database)?;
        Ok(())
    }
}
