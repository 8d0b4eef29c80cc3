//! SeaORM entities for the engine's tables

pub mod active_run;
pub mod audit;
pub mod device;
pub mod job;
pub mod record;

pub use active_run::Entity as ActiveRun;
pub use audit::Entity as AuditEntry;
pub use device::Entity as DeviceRow;
pub use job::Entity as Job;
pub use record::Entity as Record;
