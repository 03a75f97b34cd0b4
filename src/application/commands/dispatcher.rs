//! Remote-command resolution (spec.md §4.4), grounded on
//! `original_source/csms/app/ocpp/message_router.py`'s `MessageRouter`:
//! local charger → send directly; charger owned by another node →
//! publish a relay envelope and poll for the response; otherwise fail.
//!
//! `RemoteStartTransaction`/`RemoteStopTransaction` additionally simulate a
//! successful outcome when the charger disappears mid-call, gated by
//! `simulate_on_disconnect` (default true, matching
//! `original_source/app/main.py`'s simulated-transaction fallback).

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::warn;

use super::SharedCommandSender;
use crate::application::session::{SessionRegistry, SessionStore};
use crate::domain::charger::{Charger, ChargerStatus};
use crate::domain::repository::{ChargerRepository, TransactionRepository};
use crate::domain::transaction::{Order, Transaction};
use crate::infrastructure::relay::{Relay, RelayEnvelope};
use crate::infrastructure::shared_registry::SharedRegistry;
use crate::support::errors::{CsmsError, CsmsResult};
use crate::support::id::{epoch_transaction_id, new_message_id};

const REMOTE_START: &str = "RemoteStartTransaction";
const REMOTE_STOP: &str = "RemoteStopTransaction";

/// Enqueues a command for a charger with no persistent connection (the pull
/// transport). Kept as a trait here, implemented by `interfaces::transport`,
/// so the application layer never depends on a concrete transport adapter.
pub trait PullQueue: Send + Sync {
    /// Returns the request id the charger's eventual POST must echo.
    fn enqueue(&self, charger_id: &str, action: &str, payload: Value) -> String;
}

pub struct CommandDispatcher {
    session_registry: Arc<SessionRegistry>,
    command_sender: SharedCommandSender,
    shared_registry: Arc<dyn SharedRegistry>,
    relay: Arc<dyn Relay>,
    pull_queue: Option<Arc<dyn PullQueue>>,
    chargers: Arc<dyn ChargerRepository>,
    transactions: Arc<dyn TransactionRepository>,
    sessions: Arc<SessionStore>,
    default_charging_rate_kw: f64,
    default_tariff_per_kwh: i64,
    simulate_on_disconnect: bool,
}

impl CommandDispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_registry: Arc<SessionRegistry>,
        command_sender: SharedCommandSender,
        shared_registry: Arc<dyn SharedRegistry>,
        relay: Arc<dyn Relay>,
        pull_queue: Option<Arc<dyn PullQueue>>,
        chargers: Arc<dyn ChargerRepository>,
        transactions: Arc<dyn TransactionRepository>,
        sessions: Arc<SessionStore>,
        default_charging_rate_kw: f64,
        default_tariff_per_kwh: i64,
        simulate_on_disconnect: bool,
    ) -> Self {
        Self {
            session_registry,
            command_sender,
            shared_registry,
            relay,
            pull_queue,
            chargers,
            transactions,
            sessions,
            default_charging_rate_kw,
            default_tariff_per_kwh,
            simulate_on_disconnect,
        }
    }

    /// Resolves a remote command per spec.md §4.2/§4.4: locally-attached
    /// charger first, then the node currently owning it, then (if nothing
    /// reports the charger connected) the pull transport's FIFO queue as a
    /// last resort before simulating an outcome.
    pub async fn send(&self, charger_id: &str, action: &str, payload: Value, timeout_secs: u64) -> CsmsResult<Value> {
        if self.session_registry.is_connected(charger_id) {
            return match self.command_sender.send_command(charger_id, action, payload.clone(), timeout_secs).await {
                Ok(v) => Ok(v),
                Err(e) => self.fallback_or_fail(charger_id, action, e).await,
            };
        }

        if let Ok(Some(owner)) = self.shared_registry.owner(charger_id).await {
            if owner != self.shared_registry.node_id() {
                return match self.relay_to(charger_id, action, payload.clone(), timeout_secs).await {
                    Ok(v) => Ok(v),
                    Err(e) => self.queue_or_fallback(charger_id, action, payload, e).await,
                };
            }
        }

        self.queue_or_fallback(charger_id, action, payload, CsmsError::ChargerNotConnected(charger_id.to_string()))
            .await
    }

    async fn relay_to(&self, charger_id: &str, action: &str, payload: Value, timeout_secs: u64) -> CsmsResult<Value> {
        let envelope = RelayEnvelope {
            message_id: new_message_id(),
            charger_id: charger_id.to_string(),
            action: action.to_string(),
            payload,
            from_node: self.shared_registry.node_id().to_string(),
            timeout_secs,
        };
        self.relay.publish_route(&envelope).await?;
        self.relay.await_response(&envelope.message_id, timeout_secs).await
    }

    /// Nothing reports the charger connected. If a pull queue is wired up,
    /// queue the command there (store-and-forward, spec.md §4.2 step 3)
    /// rather than immediately falling back to simulation.
    async fn queue_or_fallback(&self, charger_id: &str, action: &str, payload: Value, err: CsmsError) -> CsmsResult<Value> {
        if let Some(pull) = &self.pull_queue {
            let request_id = pull.enqueue(charger_id, action, payload);
            return Ok(json!({ "status": "queued", "requestId": request_id }));
        }
        self.fallback_or_fail(charger_id, action, err).await
    }

    /// spec.md §4.4 fallback: a mid-call disconnect on a simulate-capable
    /// action still produces a consistent operator-visible record.
    async fn fallback_or_fail(&self, charger_id: &str, action: &str, err: CsmsError) -> CsmsResult<Value> {
        let simulatable = matches!(action, REMOTE_START | REMOTE_STOP);
        if !self.simulate_on_disconnect || !simulatable {
            return Err(err);
        }

        warn!(charger_id, action, error = %err, "simulating remote command outcome after disconnect");
        match action {
            REMOTE_START => Ok(self.simulate_start(charger_id).await),
            REMOTE_STOP => Ok(self.simulate_stop(charger_id).await),
            _ => unreachable!(),
        }
    }

    async fn simulate_start(&self, charger_id: &str) -> Value {
        let transaction_id = epoch_transaction_id();
        let mut charger = self.load_or_create_charger(charger_id).await;

        let tx = Transaction::new(transaction_id, charger_id, "simulated", 0, charger.charging_rate_kw, charger.tariff_per_kwh);
        if let Err(e) = self.transactions.save(&tx).await {
            warn!(charger_id, error = %e, "failed to persist simulated transaction");
        }
        let order = Order::from_transaction(&tx);
        if let Err(e) = self.transactions.save_order(&order).await {
            warn!(charger_id, error = %e, "failed to persist simulated order");
        }

        self.sessions.mutate(charger_id, |s| s.start_transaction(transaction_id));
        charger.set_status(ChargerStatus::Charging);
        self.persist_charger(&charger).await;

        json!({ "status": "Accepted", "transactionId": transaction_id, "simulated": true })
    }

    async fn simulate_stop(&self, charger_id: &str) -> Value {
        let tx_id = self.sessions.mutate(charger_id, |s| s.transaction_id);
        if let Some(tx_id) = tx_id {
            if let Ok(Some(mut tx)) = self.transactions.find_by_id(tx_id).await {
                tx.stop(chrono::Utc::now(), None);
                let _ = self.transactions.update(&tx).await;
                if let Ok(Some(mut order)) = self.transactions.find_order_by_transaction(tx_id).await {
                    order.sync_from_transaction(&tx);
                    let _ = self.transactions.update_order(&order).await;
                }
            }
        }

        self.sessions.mutate(charger_id, |s| s.clear_transaction());
        let mut charger = self.load_or_create_charger(charger_id).await;
        charger.set_status(ChargerStatus::Available);
        self.persist_charger(&charger).await;

        json!({ "status": "Accepted", "simulated": true })
    }

    async fn load_or_create_charger(&self, charger_id: &str) -> Charger {
        match self.chargers.find_by_id(charger_id).await {
            Ok(Some(c)) => c,
            _ => Charger::new(charger_id, self.default_charging_rate_kw, self.default_tariff_per_kwh),
        }
    }

    async fn persist_charger(&self, charger: &Charger) {
        if let Err(e) = self.chargers.upsert(charger).await {
            warn!(charger_id = %charger.id, error = %e, "failed to persist charger after simulated command");
        }
    }
}
