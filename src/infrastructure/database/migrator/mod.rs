//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_chargers;
mod m20240101_000002_create_transactions;
mod m20240101_000003_create_orders;
mod m20240101_000004_create_meter_values;
mod m20240101_000005_create_heartbeat_events;
mod m20240101_000006_create_status_events;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_chargers::Migration),
            Box::new(m20240101_000002_create_transactions::Migration),
            Box::new(m20240101_000003_create_orders::Migration),
            Box::new(m20240101_000004_create_meter_values::Migration),
            Box::new(m20240101_000005_create_heartbeat_events::Migration),
            Box::new(m20240101_000006_create_status_events::Migration),
        ]
    }
}
