//! Create status_events table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StatusEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StatusEvents::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StatusEvents::ChargerId).string().not_null())
                    .col(
                        ColumnDef::new(StatusEvents::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StatusEvents::NewStatus).string().not_null())
                    .col(ColumnDef::new(StatusEvents::PreviousStatus).string().not_null())
                    .col(ColumnDef::new(StatusEvents::DurationHeldSecs).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_status_events_charger")
                    .table(StatusEvents::Table)
                    .col(StatusEvents::ChargerId)
                    .col(StatusEvents::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StatusEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum StatusEvents {
    Table,
    Id,
    ChargerId,
    Timestamp,
    NewStatus,
    PreviousStatus,
    DurationHeldSecs,
}
