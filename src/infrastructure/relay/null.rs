//! No-op `Relay` used when distributed mode is disabled.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Relay, RelayEnvelope};
use crate::support::errors::{CsmsError, CsmsResult};

pub struct NullRelay;

#[async_trait]
impl Relay for NullRelay {
    async fn publish_route(&self, envelope: &RelayEnvelope) -> CsmsResult<()> {
        Err(CsmsError::ChargerNotConnected(envelope.charger_id.clone()))
    }

    async fn await_response(&self, _message_id: &str, _timeout_secs: u64) -> CsmsResult<serde_json::Value> {
        Err(CsmsError::Timeout)
    }

    async fn publish_response(&self, _message_id: &str, _timeout_secs: u64, _payload: &serde_json::Value) -> CsmsResult<()> {
        Ok(())
    }

    async fn subscribe_routes(&self) -> CsmsResult<mpsc::Receiver<RelayEnvelope>> {
        // Channel with no live sender: the receiver end immediately reports
        // closed, so a listener loop built on this exits right away.
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }
}
