//! OCPP message dispatcher (spec.md §4.3): routes `(chargerID, action,
//! payload)` to a handler function and returns the response payload.
//!
//! Grounded on the teacher's `action_matcher`, collapsed to the single
//! OCPP-1.6-only dispatch table keyed by the literal action string
//! (spec.md §9: dynamic dispatch on action name, no inheritance hierarchy).

pub mod handlers;

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::warn;

use crate::application::history::HistoryRecorder;
use crate::application::session::SharedSessionStore;
use crate::domain::repository::{ChargerRepository, HistoryRepository, TransactionRepository};

/// Shared handles every handler needs. Cheap to clone (all fields are
/// `Arc`s or plain values), one instance is built at startup.
#[derive(Clone)]
pub struct Services {
    pub chargers: Arc<dyn ChargerRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub history: Arc<HistoryRecorder>,
    pub sessions: SharedSessionStore,
    pub default_charging_rate_kw: f64,
    pub default_tariff_per_kwh: i64,
    pub heartbeat_interval_secs: i64,
    pub id_tag_blocklist: Arc<Vec<String>>,
    /// Per-charger serialization mailbox (spec.md §5): a worker must hold
    /// this lock across the whole handler invocation for one charger, but
    /// different chargers proceed independently.
    charger_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl Services {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chargers: Arc<dyn ChargerRepository>,
        transactions: Arc<dyn TransactionRepository>,
        history_repo: Arc<dyn HistoryRepository>,
        sessions: SharedSessionStore,
        default_charging_rate_kw: f64,
        default_tariff_per_kwh: i64,
        heartbeat_interval_secs: i64,
    ) -> Self {
        Self {
            chargers,
            transactions,
            history: Arc::new(HistoryRecorder::new(history_repo)),
            sessions,
            default_charging_rate_kw,
            default_tariff_per_kwh,
            heartbeat_interval_secs,
            id_tag_blocklist: Arc::new(Vec::new()),
            charger_locks: Arc::new(DashMap::new()),
        }
    }

    fn lock_for(&self, charger_id: &str) -> Arc<Mutex<()>> {
        self.charger_locks
            .entry(charger_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

type HandlerFn = for<'a> fn(&'a Services, &'a str, Value) -> BoxFuture<'a, Value>;

fn action_table() -> HashMap<&'static str, HandlerFn> {
    let mut table: HashMap<&'static str, HandlerFn> = HashMap::new();
    table.insert("BootNotification", |s, c, p| Box::pin(handlers::boot_notification::handle(s, c, p)));
    table.insert("Heartbeat", |s, c, p| Box::pin(handlers::heartbeat::handle(s, c, p)));
    table.insert("StatusNotification", |s, c, p| Box::pin(handlers::status_notification::handle(s, c, p)));
    table.insert("Authorize", |s, c, p| Box::pin(handlers::authorize::handle(s, c, p)));
    table.insert("StartTransaction", |s, c, p| Box::pin(handlers::start_transaction::handle(s, c, p)));
    table.insert("StopTransaction", |s, c, p| Box::pin(handlers::stop_transaction::handle(s, c, p)));
    table.insert("MeterValues", |s, c, p| Box::pin(handlers::meter_values::handle(s, c, p)));
    table.insert("FirmwareStatusNotification", |s, c, p| {
        Box::pin(handlers::firmware_status_notification::handle(s, c, p, "firmware"))
    });
    table.insert("DiagnosticsStatusNotification", |s, c, p| {
        Box::pin(handlers::firmware_status_notification::handle(s, c, p, "diagnostics"))
    });
    table.insert("DataTransfer", |s, c, p| Box::pin(handlers::data_transfer::handle(s, c, p)));
    table
}

fn table() -> &'static HashMap<&'static str, HandlerFn> {
    static TABLE: OnceLock<HashMap<&'static str, HandlerFn>> = OnceLock::new();
    TABLE.get_or_init(action_table)
}

/// Route one inbound `(chargerID, action, payload)` triple to its handler,
/// or the `UnknownAction` fallback (spec.md §4.3 final line). Serializes
/// all work for a single charger behind its per-charger lock (spec.md §5);
/// different chargers dispatch concurrently.
pub async fn dispatch(services: &Services, charger_id: &str, action: &str, payload: Value) -> Value {
    let handler = table().get(action).copied();
    let Some(f) = handler else {
        warn!(charger_id, action, "unknown OCPP action");
        return json!({ "error": "UnknownAction", "action": action });
    };

    let lock = services.lock_for(charger_id);
    let _guard = lock.lock().await;
    f(services, charger_id, payload).await
}
