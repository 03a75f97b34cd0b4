//! Append-only history streams (spec.md §3/§4.6): HeartbeatEvent, StatusEvent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::charger::ChargerStatus;
use crate::support::time::HealthBand;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatEvent {
    pub id: i32,
    pub charger_id: String,
    pub timestamp: DateTime<Utc>,
    pub interval_secs: i64,
    pub health_band: String,
}

impl HeartbeatEvent {
    /// Build from the previous heartbeat timestamp, computing the interval
    /// and health band (normal <=35s, warning <=60s, else abnormal).
    pub fn since(charger_id: impl Into<String>, now: DateTime<Utc>, previous: Option<DateTime<Utc>>) -> Self {
        let interval_secs = previous.map(|p| (now - p).num_seconds()).unwrap_or(0);
        let band = HealthBand::from_interval_secs(interval_secs);
        Self {
            id: 0,
            charger_id: charger_id.into(),
            timestamp: now,
            interval_secs,
            health_band: band.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEvent {
    pub id: i32,
    pub charger_id: String,
    pub timestamp: DateTime<Utc>,
    pub new_status: String,
    pub previous_status: String,
    pub duration_held_secs: i64,
}

impl StatusEvent {
    pub fn transition(
        charger_id: impl Into<String>,
        now: DateTime<Utc>,
        previous_status: ChargerStatus,
        previous_status_since: DateTime<Utc>,
        new_status: ChargerStatus,
    ) -> Self {
        Self {
            id: 0,
            charger_id: charger_id.into(),
            timestamp: now,
            new_status: new_status.as_str().to_string(),
            previous_status: previous_status.as_str().to_string(),
            duration_held_secs: (now - previous_status_since).num_seconds().max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn heartbeat_bands_classify_correctly() {
        let now = Utc::now();
        let e = HeartbeatEvent::since("CP001", now, Some(now - Duration::seconds(30)));
        assert_eq!(e.health_band, "normal");
        let e = HeartbeatEvent::since("CP001", now, Some(now - Duration::seconds(50)));
        assert_eq!(e.health_band, "warning");
        let e = HeartbeatEvent::since("CP001", now, Some(now - Duration::seconds(90)));
        assert_eq!(e.health_band, "abnormal");
    }

    #[test]
    fn status_event_records_duration_held() {
        let since = Utc::now() - Duration::seconds(120);
        let now = Utc::now();
        let e = StatusEvent::transition("CP001", now, ChargerStatus::Charging, since, ChargerStatus::Available);
        assert_eq!(e.previous_status, "Charging");
        assert_eq!(e.new_status, "Available");
        assert!(e.duration_held_secs >= 119);
    }
}
