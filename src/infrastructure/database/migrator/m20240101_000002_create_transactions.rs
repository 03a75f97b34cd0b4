//! Create transactions table

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_chargers::Chargers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Transactions::Id).integer().not_null().primary_key())
                    .col(ColumnDef::new(Transactions::ChargerId).string().not_null())
                    .col(ColumnDef::new(Transactions::IdTag).string().not_null())
                    .col(ColumnDef::new(Transactions::UserId).string())
                    .col(
                        ColumnDef::new(Transactions::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::EndTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(Transactions::MeterStart).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::MeterStop).big_integer())
                    .col(ColumnDef::new(Transactions::EnergyKwh).double())
                    .col(ColumnDef::new(Transactions::DurationMinutes).double())
                    .col(ColumnDef::new(Transactions::ChargingRateKw).double().not_null())
                    .col(ColumnDef::new(Transactions::PriceSnapshot).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::TotalCost).double())
                    .col(
                        ColumnDef::new(Transactions::Status)
                            .string()
                            .not_null()
                            .default("ongoing"),
                    )
                    .col(
                        ColumnDef::new(Transactions::MeterSuperseded)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_charger")
                            .from(Transactions::Table, Transactions::ChargerId)
                            .to(Chargers::Table, Chargers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_charger_status")
                    .table(Transactions::Table)
                    .col(Transactions::ChargerId)
                    .col(Transactions::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Transactions {
    Table,
    Id,
    ChargerId,
    IdTag,
    UserId,
    StartTime,
    EndTime,
    MeterStart,
    MeterStop,
    EnergyKwh,
    DurationMinutes,
    ChargingRateKw,
    PriceSnapshot,
    TotalCost,
    Status,
    MeterSuperseded,
}
