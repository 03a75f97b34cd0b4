//! Read/command facade used by the minimal HTTP admin surface
//! (`interfaces::http`), grounded on the teacher's
//! `application/services/charge_point.rs`, trimmed to what spec.md §6.1's
//! thin admin surface actually calls — no billing/tariff/user CRUD.

use std::sync::Arc;

use serde_json::Value;

use crate::application::commands::dispatcher::CommandDispatcher;
use crate::domain::charger::Charger;
use crate::domain::repository::{ChargerRepository, TransactionRepository};
use crate::domain::transaction::Transaction;
use crate::support::errors::{CsmsError, CsmsResult};

pub struct ChargePointService {
    chargers: Arc<dyn ChargerRepository>,
    transactions: Arc<dyn TransactionRepository>,
    dispatcher: Arc<CommandDispatcher>,
    default_command_timeout_secs: u64,
}

impl ChargePointService {
    pub fn new(
        chargers: Arc<dyn ChargerRepository>,
        transactions: Arc<dyn TransactionRepository>,
        dispatcher: Arc<CommandDispatcher>,
        default_command_timeout_secs: u64,
    ) -> Self {
        Self {
            chargers,
            transactions,
            dispatcher,
            default_command_timeout_secs,
        }
    }

    pub async fn list_chargers(&self) -> CsmsResult<Vec<Charger>> {
        self.chargers.find_all().await
    }

    pub async fn get_charger(&self, charger_id: &str) -> CsmsResult<Charger> {
        self.chargers
            .find_by_id(charger_id)
            .await?
            .ok_or_else(|| CsmsError::ChargerNotFound(charger_id.to_string()))
    }

    pub async fn transaction_history(&self, charger_id: &str) -> CsmsResult<Vec<Transaction>> {
        self.transactions.find_by_charger(charger_id).await
    }

    /// Routes an operator-initiated command through the resolution
    /// algorithm (local / relay / fail) spec.md §4.4 describes.
    pub async fn send_command(&self, charger_id: &str, action: &str, payload: Value) -> CsmsResult<Value> {
        self.dispatcher
            .send(charger_id, action, payload, self.default_command_timeout_secs)
            .await
    }
}
