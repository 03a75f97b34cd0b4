//! StartTransaction (spec.md §4.3): allocate a transactionId, pair the
//! session to it, insert the Transaction/Order rows, and move the charger
//! into `Charging`. Rejects with `ConcurrentTx` if one is already ongoing.

use serde_json::{json, Value};
use tracing::warn;

use super::common::{load_or_create_charger, persist_charger};
use crate::application::dispatcher::Services;
use crate::domain::charger::ChargerStatus;
use crate::domain::transaction::{Order, Transaction};
use crate::support::id::epoch_transaction_id;

pub async fn handle(services: &Services, charger_id: &str, payload: Value) -> Value {
    let already_ongoing = services
        .sessions
        .mutate(charger_id, |session| session.has_active_transaction());
    if already_ongoing {
        warn!(charger_id, "StartTransaction rejected: transaction already ongoing");
        return json!({ "status": "ConcurrentTx" });
    }

    let mut charger = load_or_create_charger(services, charger_id).await;

    let id_tag = payload
        .get("idTag")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let meter_start = payload.get("meterStart").and_then(Value::as_i64).unwrap_or(0);
    let transaction_id = payload
        .get("transactionId")
        .and_then(Value::as_i64)
        .map(|v| v as i32)
        .unwrap_or_else(epoch_transaction_id);

    let tx = Transaction::new(
        transaction_id,
        charger_id,
        id_tag,
        meter_start,
        charger.charging_rate_kw,
        charger.tariff_per_kwh,
    );

    if let Err(e) = services.transactions.save(&tx).await {
        warn!(charger_id, error = %e, "failed to persist new transaction, protocol response still returned");
    }
    let order = Order::from_transaction(&tx);
    if let Err(e) = services.transactions.save_order(&order).await {
        warn!(charger_id, error = %e, "failed to persist new order, protocol response still returned");
    }

    services.sessions.mutate(charger_id, |session| {
        session.start_transaction(transaction_id);
    });

    charger.set_status(ChargerStatus::Charging);
    persist_charger(services, &charger).await;

    json!({
        "transactionId": transaction_id,
        "idTagInfo": { "status": "Accepted" },
    })
}
