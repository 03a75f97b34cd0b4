//! FirmwareStatusNotification / DiagnosticsStatusNotification (spec.md
//! §4.3): record the reported status string and return empty. Shared
//! between both actions — they carry the same `status` field shape.

use serde_json::{json, Value};
use tracing::info;

use crate::application::dispatcher::Services;

pub async fn handle(_services: &Services, charger_id: &str, payload: Value, kind: &str) -> Value {
    let status = payload.get("status").and_then(Value::as_str).unwrap_or("Unknown");
    info!(charger_id, kind, status, "status notification");
    json!({})
}
