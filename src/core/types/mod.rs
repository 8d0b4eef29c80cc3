//! Shared domain types for the bulk change engine

pub mod change;
pub mod job;
pub mod outcome;
pub mod record;

pub use change::{
    CarrierRatePlanChange, ChangeRequest, CustomerAssociationChange, CustomerRatePlanChange,
    IdentifierSwapChange, StatusUpdateChange, UsernameUpdateChange,
};
pub use job::{BulkChangeJob, ChangeType, Integration, JobStatus};
pub use outcome::{AbortReason, RecordCounts, RecordOutcome, RunOutcome};
pub use record::{Device, DeviceChangeRecord, DeviceIdentifier, IdentifierKind, RecordStatus};
