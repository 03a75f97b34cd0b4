//! SeaORM implementation of HistoryRepository: append-only heartbeat and
//! status event streams.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::domain::history::{HeartbeatEvent, StatusEvent};
use crate::domain::repository::HistoryRepository;
use crate::infrastructure::database::entities::{heartbeat_event, status_event};
use crate::support::errors::CsmsResult;

pub struct SeaOrmHistoryRepository {
    db: DatabaseConnection,
}

impl SeaOrmHistoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HistoryRepository for SeaOrmHistoryRepository {
    async fn append_heartbeat(&self, event: &HeartbeatEvent) -> CsmsResult<()> {
        let model = heartbeat_event::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            charger_id: Set(event.charger_id.clone()),
            timestamp: Set(event.timestamp),
            interval_secs: Set(event.interval_secs),
            health_band: Set(event.health_band.clone()),
        };
        model.insert(&self.db).await?;
        Ok(())
    }

    async fn append_status(&self, event: &StatusEvent) -> CsmsResult<()> {
        let model = status_event::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            charger_id: Set(event.charger_id.clone()),
            timestamp: Set(event.timestamp),
            new_status: Set(event.new_status.clone()),
            previous_status: Set(event.previous_status.clone()),
            duration_held_secs: Set(event.duration_held_secs),
        };
        model.insert(&self.db).await?;
        Ok(())
    }

    async fn last_heartbeat(&self, charger_id: &str) -> CsmsResult<Option<HeartbeatEvent>> {
        let model = heartbeat_event::Entity::find()
            .filter(heartbeat_event::Column::ChargerId.eq(charger_id))
            .order_by_desc(heartbeat_event::Column::Timestamp)
            .one(&self.db)
            .await?;
        Ok(model.map(|m| HeartbeatEvent {
            id: m.id,
            charger_id: m.charger_id,
            timestamp: m.timestamp,
            interval_secs: m.interval_secs,
            health_band: m.health_band,
        }))
    }
}
