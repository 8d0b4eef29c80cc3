use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Devices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Devices::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Devices::ServiceProviderId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Devices::Iccid).string_len(32).null())
                    .col(ColumnDef::new(Devices::Msisdn).string_len(32).null())
                    .col(ColumnDef::new(Devices::Imei).string_len(32).null())
                    .col(ColumnDef::new(Devices::Eid).string_len(40).null())
                    .col(ColumnDef::new(Devices::Status).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Devices::CarrierRatePlan)
                            .string_len(64)
                            .null(),
                    )
                    .col(ColumnDef::new(Devices::CommPlan).string_len(64).null())
                    .col(ColumnDef::new(Devices::CustomerRatePlanId).integer().null())
                    .col(ColumnDef::new(Devices::CustomerPoolId).integer().null())
                    .col(
                        ColumnDef::new(Devices::CustomerDataAllocationMb)
                            .double()
                            .null(),
                    )
                    .col(ColumnDef::new(Devices::Username).string_len(255).null())
                    .col(ColumnDef::new(Devices::CostCenter1).string_len(64).null())
                    .col(ColumnDef::new(Devices::CostCenter2).string_len(64).null())
                    .col(ColumnDef::new(Devices::CostCenter3).string_len(64).null())
                    .col(ColumnDef::new(Devices::CustomerRef).string_len(64).null())
                    .col(ColumnDef::new(Devices::SiteId).integer().null())
                    .col(ColumnDef::new(Devices::ModifiedBy).string_len(255).null())
                    .col(
                        ColumnDef::new(Devices::ModifiedDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_devices_service_provider_iccid")
                    .table(Devices::Table)
                    .col(Devices::ServiceProviderId)
                    .col(Devices::Iccid)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Devices::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Devices {
    Table,
    Id,
    ServiceProviderId,
    Iccid,
    Msisdn,
    Imei,
    Eid,
    Status,
    CarrierRatePlan,
    CommPlan,
    CustomerRatePlanId,
    CustomerPoolId,
    CustomerDataAllocationMb,
    Username,
    CostCenter1,
    CostCenter2,
    CostCenter3,
    CustomerRef,
    SiteId,
    ModifiedBy,
    ModifiedDate,
}
