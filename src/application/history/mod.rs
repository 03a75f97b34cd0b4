//! History recorder (spec.md §4.6): wraps `HistoryRepository` with the
//! lookups needed to compute each event's derived fields, tolerating
//! transient write failures the same way the dispatcher handlers do.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::charger::ChargerStatus;
use crate::domain::history::{HeartbeatEvent, StatusEvent};
use crate::domain::repository::HistoryRepository;

pub struct HistoryRecorder {
    repo: Arc<dyn HistoryRepository>,
}

impl HistoryRecorder {
    pub fn new(repo: Arc<dyn HistoryRepository>) -> Self {
        Self { repo }
    }

    /// Append a HeartbeatEvent, deriving interval/health-band from the
    /// charger's last recorded heartbeat (not from in-memory state, so this
    /// stays correct across restarts).
    pub async fn record_heartbeat(&self, charger_id: &str) {
        let previous = match self.repo.last_heartbeat(charger_id).await {
            Ok(p) => p.map(|e| e.timestamp),
            Err(e) => {
                warn!(charger_id, error = %e, "failed to look up last heartbeat, recording without interval");
                None
            }
        };

        let event = HeartbeatEvent::since(charger_id, Utc::now(), previous);
        if let Err(e) = self.repo.append_heartbeat(&event).await {
            warn!(charger_id, error = %e, "failed to persist heartbeat event");
        }
    }

    /// Append a StatusEvent capturing the transition and how long the
    /// previous status was held.
    pub async fn record_status_transition(
        &self,
        charger_id: &str,
        previous_status: ChargerStatus,
        previous_status_since: DateTime<Utc>,
        new_status: ChargerStatus,
    ) {
        let event = StatusEvent::transition(charger_id, Utc::now(), previous_status, previous_status_since, new_status);
        if let Err(e) = self.repo.append_status(&event).await {
            warn!(charger_id, error = %e, "failed to persist status event");
        }
    }
}
