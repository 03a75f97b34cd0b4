//! Background silence monitor (spec.md §4.7 addition), grounded on the
//! teacher's `application/services/heartbeat_monitor.rs`: periodically
//! marks chargers `Offline` once they have gone quiet past a threshold.
//! Independent of the socket transport's own ping/pong deadline — this is
//! what gives the pull and pub/sub transports an offline transition too,
//! since neither carries a keepalive frame of its own.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::charger::ChargerStatus;
use crate::domain::repository::ChargerRepository;
use crate::support::shutdown::ShutdownSignal;

#[derive(Debug, Clone, Copy)]
pub struct HeartbeatMonitorConfig {
    pub check_interval_secs: u64,
    pub offline_threshold_secs: i64,
}

impl Default for HeartbeatMonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 30,
            offline_threshold_secs: 90,
        }
    }
}

pub struct HeartbeatMonitor {
    chargers: Arc<dyn ChargerRepository>,
    config: HeartbeatMonitorConfig,
}

impl HeartbeatMonitor {
    pub fn new(chargers: Arc<dyn ChargerRepository>, config: HeartbeatMonitorConfig) -> Self {
        Self { chargers, config }
    }

    pub fn spawn(self: Arc<Self>, shutdown: ShutdownSignal) {
        tokio::spawn(async move {
            info!(
                interval_secs = self.config.check_interval_secs,
                threshold_secs = self.config.offline_threshold_secs,
                "heartbeat monitor started"
            );
            let mut interval = tokio::time::interval(Duration::from_secs(self.config.check_interval_secs));

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.sweep().await {
                            warn!(error = %e, "heartbeat monitor sweep failed");
                        }
                    }
                    _ = shutdown.notified().wait() => {
                        info!("heartbeat monitor shutting down");
                        break;
                    }
                }
            }
        });
    }

    async fn sweep(&self) -> crate::support::errors::CsmsResult<()> {
        let now = Utc::now();
        for mut charger in self.chargers.find_all().await? {
            if charger.status == ChargerStatus::Offline {
                continue;
            }
            let silent_for = (now - charger.last_seen).num_seconds();
            if silent_for >= self.config.offline_threshold_secs {
                warn!(charger_id = %charger.id, silent_for, "charger silent past threshold, marking offline");
                charger.set_status(ChargerStatus::Offline);
                self.chargers.upsert(&charger).await?;
            }
        }
        Ok(())
    }
}
