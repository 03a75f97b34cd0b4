//! SeaORM implementation of ChargerRepository

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::debug;

use crate::domain::charger::{Charger, ChargerStatus};
use crate::domain::repository::ChargerRepository;
use crate::infrastructure::database::entities::charger;
use crate::support::errors::CsmsResult;

pub struct SeaOrmChargerRepository {
    db: DatabaseConnection,
}

impl SeaOrmChargerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_model(c: &Charger) -> charger::ActiveModel {
    charger::ActiveModel {
        id: Set(c.id.clone()),
        vendor: Set(c.vendor.clone()),
        model: Set(c.model.clone()),
        serial_number: Set(c.serial_number.clone()),
        firmware_version: Set(c.firmware_version.clone()),
        connector_type: Set(c.connector_type.clone()),
        charging_rate_kw: Set(c.charging_rate_kw),
        tariff_per_kwh: Set(c.tariff_per_kwh),
        latitude: Set(c.latitude),
        longitude: Set(c.longitude),
        address: Set(c.address.clone()),
        status: Set(c.status.as_str().to_string()),
        last_seen: Set(c.last_seen),
        active: Set(c.active),
        created_at: Set(c.created_at),
        updated_at: Set(c.updated_at),
    }
}

fn from_model(m: charger::Model) -> Charger {
    Charger {
        id: m.id,
        vendor: m.vendor,
        model: m.model,
        serial_number: m.serial_number,
        firmware_version: m.firmware_version,
        connector_type: m.connector_type,
        charging_rate_kw: m.charging_rate_kw,
        tariff_per_kwh: m.tariff_per_kwh,
        latitude: m.latitude,
        longitude: m.longitude,
        address: m.address,
        status: ChargerStatus::from(m.status.as_str()),
        last_seen: m.last_seen,
        active: m.active,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

#[async_trait]
impl ChargerRepository for SeaOrmChargerRepository {
    async fn save(&self, charger: &Charger) -> CsmsResult<()> {
        debug!(charger_id = %charger.id, "inserting charger");
        to_model(charger).insert(&self.db).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> CsmsResult<Option<Charger>> {
        let model = charger::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(from_model))
    }

    async fn find_all(&self) -> CsmsResult<Vec<Charger>> {
        let models = charger::Entity::find().all(&self.db).await?;
        Ok(models.into_iter().map(from_model).collect())
    }

    async fn upsert(&self, charger: &Charger) -> CsmsResult<()> {
        let existing = charger::Entity::find_by_id(&charger.id).one(&self.db).await?;
        if existing.is_some() {
            to_model(charger).update(&self.db).await?;
        } else {
            to_model(charger).insert(&self.db).await?;
        }
        Ok(())
    }
}
