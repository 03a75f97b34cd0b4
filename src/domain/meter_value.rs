//! MeterValue: append-only metering samples (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterValue {
    pub id: i32,
    pub charger_id: String,
    pub transaction_id: i32,
    pub timestamp: DateTime<Utc>,
    pub wh: i64,
    pub raw_sampled_values: Option<Value>,
}

impl MeterValue {
    pub fn new(charger_id: impl Into<String>, transaction_id: i32, wh: i64, raw: Option<Value>) -> Self {
        Self {
            id: 0,
            charger_id: charger_id.into(),
            transaction_id,
            timestamp: Utc::now(),
            wh,
            raw_sampled_values: raw,
        }
    }
}

/// Extract the `Energy.Active.Import.Register` measurand from a nested
/// OCPP 1.6 `meterValue[].sampledValue[]` payload (spec.md §4.3/§9: the
/// nested form is the sole implementation, the legacy flat `meter` field
/// is not carried over).
pub fn extract_energy_register_wh(payload: &Value) -> Option<i64> {
    let meter_values = payload.get("meterValue")?.as_array()?;
    for mv in meter_values {
        let sampled = mv.get("sampledValue")?.as_array()?;
        for sample in sampled {
            let measurand = sample.get("measurand").and_then(Value::as_str);
            let is_energy_register =
                measurand.is_none() || measurand == Some("Energy.Active.Import.Register");
            if !is_energy_register {
                continue;
            }
            let raw = sample.get("value")?.as_str()?;
            if let Ok(parsed) = raw.parse::<f64>() {
                let unit = sample.get("unit").and_then(Value::as_str).unwrap_or("Wh");
                let wh = if unit.eq_ignore_ascii_case("kWh") {
                    parsed * 1000.0
                } else {
                    parsed
                };
                return Some(wh.round() as i64);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_energy_register_measurand() {
        let payload = json!({
            "connectorId": 1,
            "transactionId": 1,
            "meterValue": [{
                "timestamp": "2024-01-01T00:00:00Z",
                "sampledValue": [
                    {"value": "230", "measurand": "Voltage"},
                    {"value": "1500", "measurand": "Energy.Active.Import.Register", "unit": "Wh"}
                ]
            }]
        });
        assert_eq!(extract_energy_register_wh(&payload), Some(1500));
    }

    #[test]
    fn converts_kwh_unit() {
        let payload = json!({
            "meterValue": [{
                "sampledValue": [
                    {"value": "1.5", "measurand": "Energy.Active.Import.Register", "unit": "kWh"}
                ]
            }]
        });
        assert_eq!(extract_energy_register_wh(&payload), Some(1500));
    }

    #[test]
    fn missing_nested_shape_returns_none() {
        let payload = json!({"meter": 1500});
        assert_eq!(extract_energy_register_wh(&payload), None);
    }
}
