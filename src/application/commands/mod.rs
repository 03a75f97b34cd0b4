//! Local command sender (spec.md §4.4): message-id-correlated calls to a
//! locally-attached charger. Grounded on the teacher's
//! `application/commands/mod.rs`, generalized from a single `SessionRegistry`
//! `send_to` call to the transport-agnostic `OutboundChannel` lookup.

pub mod dispatcher;
pub mod relay_responder;

pub use dispatcher::{CommandDispatcher, PullQueue};
pub use relay_responder::RelayResponder;

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::application::session::SharedSessionRegistry;
use crate::support::errors::{CsmsError, CsmsResult};
use crate::support::id::new_message_id;
use crate::support::ocpp_frame::OcppFrame;

struct PendingRequest {
    action: String,
    response_sender: oneshot::Sender<CsmsResult<Value>>,
}

pub struct CommandSender {
    session_registry: SharedSessionRegistry,
    pending: DashMap<(String, String), PendingRequest>,
}

pub type SharedCommandSender = Arc<CommandSender>;

impl CommandSender {
    pub fn new(session_registry: SharedSessionRegistry) -> Self {
        Self {
            session_registry,
            pending: DashMap::new(),
        }
    }

    pub fn shared(session_registry: SharedSessionRegistry) -> SharedCommandSender {
        Arc::new(Self::new(session_registry))
    }

    /// Send `action`/`payload` to a locally-attached charger and await its
    /// CALLRESULT/CALLERROR, correlated by message id.
    pub async fn send_command(&self, charger_id: &str, action: &str, payload: Value, timeout_secs: u64) -> CsmsResult<Value> {
        let channel = self
            .session_registry
            .lookup(charger_id)
            .ok_or_else(|| CsmsError::ChargerNotConnected(charger_id.to_string()))?;

        let message_id = new_message_id();
        let frame = OcppFrame::Call {
            unique_id: message_id.clone(),
            action: action.to_string(),
            payload,
        };

        let (tx, rx) = oneshot::channel();
        let key = (charger_id.to_string(), message_id.clone());
        self.pending.insert(
            key.clone(),
            PendingRequest {
                action: action.to_string(),
                response_sender: tx,
            },
        );

        info!(charger_id, action, message_id = message_id.as_str(), "sending remote command");

        if let Err(e) = channel.send(frame.serialize()).await {
            self.pending.remove(&key);
            return Err(e);
        }

        match timeout(Duration::from_secs(timeout_secs), rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                self.pending.remove(&key);
                Err(CsmsError::Transient("response channel closed".to_string()))
            }
            Err(_) => {
                self.pending.remove(&key);
                warn!(charger_id, action, message_id = message_id.as_str(), "remote command timed out");
                Err(CsmsError::Timeout)
            }
        }
    }

    pub fn handle_response(&self, charger_id: &str, message_id: &str, payload: Value) {
        let key = (charger_id.to_string(), message_id.to_string());
        if let Some((_, pending)) = self.pending.remove(&key) {
            info!(charger_id, action = pending.action.as_str(), message_id, "received command response");
            let _ = pending.response_sender.send(Ok(payload));
        } else {
            warn!(charger_id, message_id, "response for unknown or already-resolved command");
        }
    }

    pub fn handle_error(&self, charger_id: &str, message_id: &str, error_code: &str, error_description: &str) {
        let key = (charger_id.to_string(), message_id.to_string());
        if let Some((_, pending)) = self.pending.remove(&key) {
            warn!(charger_id, action = pending.action.as_str(), message_id, error_code, "received command error");
            let _ = pending
                .response_sender
                .send(Err(CsmsError::ProtocolViolation(format!("{error_code}: {error_description}"))));
        }
    }

    /// Fail every pending request for a charger that just disconnected.
    pub fn cleanup_charge_point(&self, charger_id: &str) {
        self.pending.retain(|key, _| key.0 != charger_id);
    }
}
