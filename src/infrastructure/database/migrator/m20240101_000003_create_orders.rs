//! Create orders table

use sea_orm_migration::prelude::*;

use super::m20240101_000002_create_transactions::Transactions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Orders::TransactionId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Orders::ChargerId).string().not_null())
                    .col(ColumnDef::new(Orders::UserId).string())
                    .col(ColumnDef::new(Orders::EnergyKwh).double())
                    .col(ColumnDef::new(Orders::DurationMinutes).double())
                    .col(ColumnDef::new(Orders::TotalCost).double())
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string()
                            .not_null()
                            .default("ongoing"),
                    )
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_transaction")
                            .from(Orders::Table, Orders::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Orders {
    Table,
    Id,
    TransactionId,
    ChargerId,
    UserId,
    EnergyKwh,
    DurationMinutes,
    TotalCost,
    Status,
    CreatedAt,
    UpdatedAt,
}
