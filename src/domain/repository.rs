//! Repository traits, one per aggregate. Sea-orm-backed implementations
//! live in `infrastructure::database::repositories`; tests use simple
//! in-memory stand-ins.

use async_trait::async_trait;

use crate::domain::charger::Charger;
use crate::domain::history::{HeartbeatEvent, StatusEvent};
use crate::domain::meter_value::MeterValue;
use crate::domain::transaction::{Order, Transaction};
use crate::support::errors::CsmsResult;

#[async_trait]
pub trait ChargerRepository: Send + Sync {
    async fn save(&self, charger: &Charger) -> CsmsResult<()>;
    async fn find_by_id(&self, id: &str) -> CsmsResult<Option<Charger>>;
    async fn find_all(&self) -> CsmsResult<Vec<Charger>>;
    /// Insert-or-update by primary key (chargers are never deleted, spec.md §3).
    async fn upsert(&self, charger: &Charger) -> CsmsResult<()>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn save(&self, tx: &Transaction) -> CsmsResult<()>;
    async fn update(&self, tx: &Transaction) -> CsmsResult<()>;
    async fn find_by_id(&self, id: i32) -> CsmsResult<Option<Transaction>>;
    async fn find_ongoing_for_charger(&self, charger_id: &str) -> CsmsResult<Option<Transaction>>;
    async fn find_by_charger(&self, charger_id: &str) -> CsmsResult<Vec<Transaction>>;
    async fn next_id(&self) -> CsmsResult<i32>;

    async fn save_order(&self, order: &Order) -> CsmsResult<()>;
    async fn update_order(&self, order: &Order) -> CsmsResult<()>;
    async fn find_order_by_transaction(&self, transaction_id: i32) -> CsmsResult<Option<Order>>;

    async fn append_meter_value(&self, mv: &MeterValue) -> CsmsResult<()>;
}

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn append_heartbeat(&self, event: &HeartbeatEvent) -> CsmsResult<()>;
    async fn append_status(&self, event: &StatusEvent) -> CsmsResult<()>;
    async fn last_heartbeat(&self, charger_id: &str) -> CsmsResult<Option<HeartbeatEvent>>;
}
