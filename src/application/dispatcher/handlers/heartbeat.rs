//! Heartbeat (spec.md §4.3): refresh last-seen, append a HeartbeatEvent
//! with computed interval and health band.

use chrono::Utc;
use serde_json::{json, Value};

use super::common::{load_or_create_charger, persist_charger};
use crate::application::dispatcher::Services;

pub async fn handle(services: &Services, charger_id: &str, _payload: Value) -> Value {
    let mut charger = load_or_create_charger(services, charger_id).await;
    let now = Utc::now();
    charger.touch(now);
    persist_charger(services, &charger).await;

    services.history.record_heartbeat(charger_id).await;

    json!({ "currentTime": now.to_rfc3339() })
}
