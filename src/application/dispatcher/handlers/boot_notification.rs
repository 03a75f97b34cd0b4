//! BootNotification (spec.md §4.3): record vendor/model/firmware/serial,
//! set status Available, return the heartbeat cadence the charger must honor.

use chrono::Utc;
use serde_json::{json, Value};

use super::common::{load_or_create_charger, persist_charger};
use crate::application::dispatcher::Services;
use crate::domain::charger::ChargerStatus;

pub async fn handle(services: &Services, charger_id: &str, payload: Value) -> Value {
    let mut charger = load_or_create_charger(services, charger_id).await;

    charger.vendor = payload
        .get("chargePointVendor")
        .and_then(Value::as_str)
        .map(String::from)
        .or(charger.vendor);
    charger.model = payload
        .get("chargePointModel")
        .and_then(Value::as_str)
        .map(String::from)
        .or(charger.model);
    charger.serial_number = payload
        .get("chargePointSerialNumber")
        .and_then(Value::as_str)
        .map(String::from)
        .or(charger.serial_number);
    charger.firmware_version = payload
        .get("firmwareVersion")
        .and_then(Value::as_str)
        .map(String::from)
        .or(charger.firmware_version);

    charger.touch(Utc::now());
    charger.set_status(ChargerStatus::Available);
    persist_charger(services, &charger).await;

    json!({
        "status": "Accepted",
        "currentTime": Utc::now().to_rfc3339(),
        "interval": services.heartbeat_interval_secs,
    })
}
