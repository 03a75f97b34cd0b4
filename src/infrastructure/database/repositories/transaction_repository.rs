//! SeaORM implementation of TransactionRepository: transactions, orders,
//! and the append-only meter_values stream.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use crate::domain::transaction::{Order, Transaction, TransactionStatus};
use crate::domain::meter_value::MeterValue;
use crate::domain::repository::TransactionRepository;
use crate::infrastructure::database::entities::{meter_value, order, transaction};
use crate::support::errors::{CsmsError, CsmsResult};

pub struct SeaOrmTransactionRepository {
    db: DatabaseConnection,
}

impl SeaOrmTransactionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn tx_to_model(tx: &Transaction) -> transaction::ActiveModel {
    transaction::ActiveModel {
        id: Set(tx.id),
        charger_id: Set(tx.charger_id.clone()),
        id_tag: Set(tx.id_tag.clone()),
        user_id: Set(tx.user_id.clone()),
        start_time: Set(tx.start_time),
        end_time: Set(tx.end_time),
        meter_start: Set(tx.meter_start),
        meter_stop: Set(tx.meter_stop),
        energy_kwh: Set(tx.energy_kwh),
        duration_minutes: Set(tx.duration_minutes),
        charging_rate_kw: Set(tx.charging_rate_kw),
        price_snapshot: Set(tx.price_snapshot),
        total_cost: Set(tx.total_cost),
        status: Set(tx.status.as_str().to_string()),
        meter_superseded: Set(tx.meter_superseded),
    }
}

fn tx_from_model(m: transaction::Model) -> Transaction {
    Transaction {
        id: m.id,
        charger_id: m.charger_id,
        id_tag: m.id_tag,
        user_id: m.user_id,
        start_time: m.start_time,
        end_time: m.end_time,
        meter_start: m.meter_start,
        meter_stop: m.meter_stop,
        energy_kwh: m.energy_kwh,
        duration_minutes: m.duration_minutes,
        charging_rate_kw: m.charging_rate_kw,
        price_snapshot: m.price_snapshot,
        total_cost: m.total_cost,
        status: TransactionStatus::from(m.status.as_str()),
        meter_superseded: m.meter_superseded,
    }
}

fn order_to_model(o: &Order) -> order::ActiveModel {
    order::ActiveModel {
        id: Set(o.id.clone()),
        transaction_id: Set(o.transaction_id),
        charger_id: Set(o.charger_id.clone()),
        user_id: Set(o.user_id.clone()),
        energy_kwh: Set(o.energy_kwh),
        duration_minutes: Set(o.duration_minutes),
        total_cost: Set(o.total_cost),
        status: Set(o.status.as_str().to_string()),
        created_at: Set(o.created_at),
        updated_at: Set(o.updated_at),
    }
}

fn order_from_model(m: order::Model) -> Order {
    Order {
        id: m.id,
        transaction_id: m.transaction_id,
        charger_id: m.charger_id,
        user_id: m.user_id,
        energy_kwh: m.energy_kwh,
        duration_minutes: m.duration_minutes,
        total_cost: m.total_cost,
        status: TransactionStatus::from(m.status.as_str()),
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

#[async_trait]
impl TransactionRepository for SeaOrmTransactionRepository {
    async fn save(&self, tx: &Transaction) -> CsmsResult<()> {
        debug!(transaction_id = tx.id, "inserting transaction");
        tx_to_model(tx).insert(&self.db).await?;
        Ok(())
    }

    async fn update(&self, tx: &Transaction) -> CsmsResult<()> {
        debug!(transaction_id = tx.id, "updating transaction");
        tx_to_model(tx).update(&self.db).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: i32) -> CsmsResult<Option<Transaction>> {
        let model = transaction::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(tx_from_model))
    }

    async fn find_ongoing_for_charger(&self, charger_id: &str) -> CsmsResult<Option<Transaction>> {
        let model = transaction::Entity::find()
            .filter(transaction::Column::ChargerId.eq(charger_id))
            .filter(transaction::Column::Status.eq("ongoing"))
            .one(&self.db)
            .await?;
        Ok(model.map(tx_from_model))
    }

    async fn find_by_charger(&self, charger_id: &str) -> CsmsResult<Vec<Transaction>> {
        let models = transaction::Entity::find()
            .filter(transaction::Column::ChargerId.eq(charger_id))
            .order_by_desc(transaction::Column::StartTime)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(tx_from_model).collect())
    }

    async fn next_id(&self) -> CsmsResult<i32> {
        let max = transaction::Entity::find()
            .order_by_desc(transaction::Column::Id)
            .one(&self.db)
            .await?
            .map(|m| m.id)
            .unwrap_or(0);
        Ok(max + 1)
    }

    async fn save_order(&self, order: &Order) -> CsmsResult<()> {
        order_to_model(order).insert(&self.db).await?;
        Ok(())
    }

    async fn update_order(&self, order: &Order) -> CsmsResult<()> {
        order_to_model(order).update(&self.db).await?;
        Ok(())
    }

    async fn find_order_by_transaction(&self, transaction_id: i32) -> CsmsResult<Option<Order>> {
        let model = order::Entity::find()
            .filter(order::Column::TransactionId.eq(transaction_id))
            .one(&self.db)
            .await?;
        Ok(model.map(order_from_model))
    }

    async fn append_meter_value(&self, mv: &MeterValue) -> CsmsResult<()> {
        let raw = mv
            .raw_sampled_values
            .as_ref()
            .map(|v| serde_json::to_string(v))
            .transpose()
            .map_err(|e| CsmsError::Transient(e.to_string()))?;
        let model = meter_value::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            charger_id: Set(mv.charger_id.clone()),
            transaction_id: Set(mv.transaction_id),
            timestamp: Set(mv.timestamp),
            wh: Set(mv.wh),
            raw_sampled_values: Set(raw),
        };
        model.insert(&self.db).await?;
        Ok(())
    }
}
