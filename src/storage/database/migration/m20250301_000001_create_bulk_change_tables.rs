use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BulkChangeJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BulkChangeJobs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BulkChangeJobs::TenantId).integer().not_null())
                    .col(
                        ColumnDef::new(BulkChangeJobs::ServiceProviderId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BulkChangeJobs::Integration)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BulkChangeJobs::ChangeType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BulkChangeJobs::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BulkChangeJobs::TotalCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BulkChangeJobs::ProcessedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BulkChangeJobs::ErrorCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BulkChangeJobs::CreatedBy)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BulkChangeJobs::CreatedDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(BulkChangeJobs::ProcessedBy)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(BulkChangeJobs::ProcessedDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DeviceChangeRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DeviceChangeRecords::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DeviceChangeRecords::BulkChangeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeviceChangeRecords::IdentifierKind)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeviceChangeRecords::IdentifierValue)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeviceChangeRecords::Msisdn)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DeviceChangeRecords::ChangeRequest)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeviceChangeRecords::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeviceChangeRecords::HasErrors)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DeviceChangeRecords::StatusDetails)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DeviceChangeRecords::Processed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DeviceChangeRecords::ProcessedBy)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DeviceChangeRecords::ProcessedDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_device_change_records_bulk_change_id")
                            .from(
                                DeviceChangeRecords::Table,
                                DeviceChangeRecords::BulkChangeId,
                            )
                            .to(BulkChangeJobs::Table, BulkChangeJobs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_device_change_records_job_unprocessed")
                    .table(DeviceChangeRecords::Table)
                    .col(DeviceChangeRecords::BulkChangeId)
                    .col(DeviceChangeRecords::Processed)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuditLogEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditLogEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AuditLogEntries::RecordId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuditLogEntries::Description)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuditLogEntries::RequestText)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuditLogEntries::ResponseText)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuditLogEntries::ResponseStatus)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuditLogEntries::HasErrors)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AuditLogEntries::LoggedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_audit_log_entries_record_id")
                            .from(AuditLogEntries::Table, AuditLogEntries::RecordId)
                            .to(DeviceChangeRecords::Table, DeviceChangeRecords::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_audit_log_entries_record_id")
                    .table(AuditLogEntries::Table)
                    .col(AuditLogEntries::RecordId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ActiveRuns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActiveRuns::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActiveRuns::JobId).big_integer().not_null())
                    .col(
                        ColumnDef::new(ActiveRuns::RequestId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActiveRuns::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_active_runs_job_id")
                    .table(ActiveRuns::Table)
                    .col(ActiveRuns::JobId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActiveRuns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuditLogEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DeviceChangeRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BulkChangeJobs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum BulkChangeJobs {
    Table,
    Id,
    TenantId,
    ServiceProviderId,
    Integration,
    ChangeType,
    Status,
    TotalCount,
    ProcessedCount,
    ErrorCount,
    CreatedBy,
    CreatedDate,
    ProcessedBy,
    ProcessedDate,
}

#[derive(Iden)]
enum DeviceChangeRecords {
    Table,
    Id,
    BulkChangeId,
    IdentifierKind,
    IdentifierValue,
    Msisdn,
    ChangeRequest,
    Status,
    HasErrors,
    StatusDetails,
    Processed,
    ProcessedBy,
    ProcessedDate,
}

#[derive(Iden)]
enum AuditLogEntries {
    Table,
    Id,
    RecordId,
    Description,
    RequestText,
    ResponseText,
    ResponseStatus,
    HasErrors,
    LoggedAt,
}

#[derive(Iden)]
enum ActiveRuns {
    Table,
    Id,
    JobId,
    RequestId,
    StartedAt,
}
