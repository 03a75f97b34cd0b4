//! DataTransfer (spec.md §4.3): vendor-specific extension point,
//! pass-through. Records vendor/messageId and acknowledges.

use serde_json::{json, Value};
use tracing::info;

use crate::application::dispatcher::Services;

pub async fn handle(_services: &Services, charger_id: &str, payload: Value) -> Value {
    let vendor_id = payload.get("vendorId").and_then(Value::as_str).unwrap_or("");
    let message_id = payload.get("messageId").and_then(Value::as_str);
    info!(charger_id, vendor_id, message_id, "DataTransfer received");

    json!({ "status": "Accepted", "data": Value::Null })
}
