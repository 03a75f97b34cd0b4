//! Authorize (spec.md §4.3): accept any non-empty idTag not on the
//! blocklist. The blocklist hook is required but starts empty, per spec.

use serde_json::{json, Value};
use tracing::warn;

use crate::application::dispatcher::Services;

pub async fn handle(services: &Services, charger_id: &str, payload: Value) -> Value {
    let id_tag = payload.get("idTag").and_then(Value::as_str).unwrap_or("");

    let accepted = !id_tag.is_empty() && !services.id_tag_blocklist.contains(&id_tag.to_string());
    if !accepted {
        warn!(charger_id, id_tag, "Authorize rejected");
    }

    json!({
        "idTagInfo": { "status": if accepted { "Accepted" } else { "Invalid" } }
    })
}
