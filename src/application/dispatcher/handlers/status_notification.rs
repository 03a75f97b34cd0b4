//! StatusNotification (spec.md §4.3/§4.5): update status, append a
//! StatusEvent, and repair desynchronized session state when the charger
//! reports `Available` on its own (no matching StopTransaction).

use chrono::Utc;
use serde_json::{json, Value};

use super::common::{load_or_create_charger, persist_charger};
use crate::application::dispatcher::Services;
use crate::domain::charger::ChargerStatus;

pub async fn handle(services: &Services, charger_id: &str, payload: Value) -> Value {
    let mut charger = load_or_create_charger(services, charger_id).await;

    let new_status = payload
        .get("status")
        .and_then(Value::as_str)
        .map(ChargerStatus::from)
        .unwrap_or(ChargerStatus::Unknown);

    let previous_status = charger.status;
    let previous_since = charger.updated_at;

    charger.touch(Utc::now());
    charger.set_status(new_status);
    persist_charger(services, &charger).await;

    services
        .history
        .record_status_transition(charger_id, previous_status, previous_since, new_status)
        .await;

    // Repair path (spec.md §4.5): a charger that skipped StopTransaction
    // but reports Available on its own clears the desynchronized session.
    if matches!(new_status, ChargerStatus::Available) {
        services.sessions.mutate(charger_id, |session| {
            if session.has_active_transaction() {
                session.clear_transaction();
            }
        });
    }

    json!({})
}
