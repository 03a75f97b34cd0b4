//! Create heartbeat_events table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HeartbeatEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HeartbeatEvents::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HeartbeatEvents::ChargerId).string().not_null())
                    .col(
                        ColumnDef::new(HeartbeatEvents::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(HeartbeatEvents::IntervalSecs).big_integer().not_null())
                    .col(ColumnDef::new(HeartbeatEvents::HealthBand).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_heartbeat_events_charger")
                    .table(HeartbeatEvents::Table)
                    .col(HeartbeatEvents::ChargerId)
                    .col(HeartbeatEvents::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HeartbeatEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum HeartbeatEvents {
    Table,
    Id,
    ChargerId,
    Timestamp,
    IntervalSecs,
    HealthBand,
}
