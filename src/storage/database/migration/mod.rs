use sea_orm_migration::prelude::*;

mod m20250301_000001_create_bulk_change_tables;
mod m20250301_000002_create_devices_table;

/// Database migrator for SeaORM
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_bulk_change_tables::Migration),
            Box::new(m20250301_000002_create_devices_table::Migration),
        ]
    }
}
