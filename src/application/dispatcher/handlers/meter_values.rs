//! MeterValues (spec.md §4.3/§9): parse the nested
//! `meterValue[].sampledValue[]` and pick `Energy.Active.Import.Register`
//! (the sole implementation — the legacy flat `meter` field is not
//! carried over). Updates the session meter monotonically (S3) and
//! appends an append-only MeterValue row.

use serde_json::{json, Value};
use tracing::warn;

use crate::application::dispatcher::Services;
use crate::domain::meter_value::{extract_energy_register_wh, MeterValue};

pub async fn handle(services: &Services, charger_id: &str, payload: Value) -> Value {
    let Some(wh) = extract_energy_register_wh(&payload) else {
        return json!({});
    };

    let accepted = services.sessions.mutate(charger_id, |session| session.update_meter(wh));
    if !accepted {
        // S3: lower reading than already recorded, reject silently.
        return json!({});
    }

    let transaction_id = payload
        .get("transactionId")
        .and_then(Value::as_i64)
        .map(|v| v as i32)
        .or_else(|| services.sessions.mutate(charger_id, |s| s.transaction_id))
        .unwrap_or(0);

    let raw = payload.get("meterValue").cloned();
    let mv = MeterValue::new(charger_id, transaction_id, wh, raw);
    if let Err(e) = services.transactions.append_meter_value(&mv).await {
        warn!(charger_id, error = %e, "failed to persist meter value, protocol response still returned");
    }

    json!({})
}
