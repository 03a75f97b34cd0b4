//! StopTransaction (spec.md §4.3): locate the ongoing transaction (by
//! `transactionId` if supplied, else via the session), derive duration and
//! energy (unless a real meter reading supersedes), mark transaction and
//! order completed, clear the session, and return the charger to
//! `Available`. Idempotent: a repeat call for an already-completed
//! transaction is a no-op that still reports success.

use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use super::common::{load_or_create_charger, persist_charger};
use crate::application::dispatcher::Services;
use crate::domain::charger::ChargerStatus;
use crate::domain::transaction::{Order, TransactionStatus};

pub async fn handle(services: &Services, charger_id: &str, payload: Value) -> Value {
    let requested_tx_id = payload
        .get("transactionId")
        .and_then(Value::as_i64)
        .map(|v| v as i32);

    let tx_id = match requested_tx_id {
        Some(id) => Some(id),
        None => services
            .sessions
            .mutate(charger_id, |session| session.transaction_id),
    };

    let Some(tx_id) = tx_id else {
        // Nothing to stop; treat as an idempotent no-op success rather
        // than surfacing an internal error to the charger.
        return json!({
            "stopped": true,
            "transactionId": Value::Null,
            "idTagInfo": { "status": "Accepted" },
        });
    };

    let tx = match services.transactions.find_by_id(tx_id).await {
        Ok(Some(tx)) => tx,
        Ok(None) => {
            return json!({
                "stopped": true,
                "transactionId": tx_id,
                "idTagInfo": { "status": "Accepted" },
            })
        }
        Err(e) => {
            warn!(charger_id, error = %e, "transaction lookup failed during StopTransaction");
            return json!({
                "stopped": true,
                "transactionId": tx_id,
                "idTagInfo": { "status": "Accepted" },
            });
        }
    };

    if tx.status != TransactionStatus::Ongoing {
        // Idempotent repeat: already completed, same success shape.
        return json!({
            "stopped": true,
            "transactionId": tx_id,
            "idTagInfo": { "status": "Accepted" },
        });
    }

    let mut tx = tx;
    let real_meter_wh = payload
        .get("meterStop")
        .and_then(Value::as_i64)
        .or_else(|| services.sessions.mutate(charger_id, |s| s.meter_wh));

    tx.stop(Utc::now(), real_meter_wh);

    if let Err(e) = services.transactions.update(&tx).await {
        warn!(charger_id, error = %e, "failed to persist transaction stop, protocol response still returned");
    }

    let order = match services.transactions.find_order_by_transaction(tx_id).await {
        Ok(Some(mut order)) => {
            order.sync_from_transaction(&tx);
            order
        }
        _ => Order::from_transaction(&tx),
    };
    if let Err(e) = services.transactions.update_order(&order).await {
        warn!(charger_id, error = %e, "failed to persist order completion, protocol response still returned");
    }

    services.sessions.mutate(charger_id, |session| {
        session.clear_transaction();
    });

    let mut charger = load_or_create_charger(services, charger_id).await;
    charger.set_status(ChargerStatus::Available);
    persist_charger(services, &charger).await;

    json!({
        "stopped": true,
        "transactionId": tx_id,
        "idTagInfo": { "status": "Accepted" },
    })
}
