//! Create chargers table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Chargers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Chargers::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Chargers::Vendor).string())
                    .col(ColumnDef::new(Chargers::Model).string())
                    .col(ColumnDef::new(Chargers::SerialNumber).string())
                    .col(ColumnDef::new(Chargers::FirmwareVersion).string())
                    .col(ColumnDef::new(Chargers::ConnectorType).string())
                    .col(
                        ColumnDef::new(Chargers::ChargingRateKw)
                            .double()
                            .not_null()
                            .default(7.0),
                    )
                    .col(
                        ColumnDef::new(Chargers::TariffPerKwh)
                            .big_integer()
                            .not_null()
                            .default(2700),
                    )
                    .col(ColumnDef::new(Chargers::Latitude).double())
                    .col(ColumnDef::new(Chargers::Longitude).double())
                    .col(ColumnDef::new(Chargers::Address).string())
                    .col(
                        ColumnDef::new(Chargers::Status)
                            .string()
                            .not_null()
                            .default("Unknown"),
                    )
                    .col(
                        ColumnDef::new(Chargers::LastSeen)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Chargers::Active).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Chargers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Chargers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Chargers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Chargers {
    Table,
    Id,
    Vendor,
    Model,
    SerialNumber,
    FirmwareVersion,
    ConnectorType,
    ChargingRateKw,
    TariffPerKwh,
    Latitude,
    Longitude,
    Address,
    Status,
    LastSeen,
    Active,
    CreatedAt,
    UpdatedAt,
}
