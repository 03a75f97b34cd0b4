//! Owning-node half of the cross-node relay (spec.md §4.4 step 2):
//! "a subscriber on `ocpp:route:*` whose `chargerID` is locally attached
//! runs the call and writes the response under the response key". Without
//! this consumer, a peer node's `CommandDispatcher::relay_to` publishes an
//! envelope that nobody ever answers.

use std::sync::Arc;

use tracing::{info, warn};

use super::CommandSender;
use crate::application::session::SharedSessionRegistry;
use crate::infrastructure::relay::{Relay, RelayEnvelope};
use crate::support::shutdown::ShutdownSignal;

pub struct RelayResponder {
    session_registry: SharedSessionRegistry,
    command_sender: Arc<CommandSender>,
    relay: Arc<dyn Relay>,
}

impl RelayResponder {
    pub fn new(session_registry: SharedSessionRegistry, command_sender: Arc<CommandSender>, relay: Arc<dyn Relay>) -> Self {
        Self { session_registry, command_sender, relay }
    }

    pub fn spawn(self: Arc<Self>, shutdown: ShutdownSignal) {
        tokio::spawn(async move {
            let mut routes = match self.relay.subscribe_routes().await {
                Ok(rx) => rx,
                Err(e) => {
                    warn!(error = %e, "relay responder failed to subscribe to routed commands");
                    return;
                }
            };
            info!("relay responder subscribed to ocpp:route:*");

            loop {
                tokio::select! {
                    envelope = routes.recv() => {
                        match envelope {
                            Some(envelope) => {
                                let this = self.clone();
                                tokio::spawn(async move { this.handle(envelope).await });
                            }
                            None => break,
                        }
                    }
                    _ = shutdown.notified().wait() => {
                        info!("relay responder shutting down");
                        break;
                    }
                }
            }
        });
    }

    /// Only answer envelopes for chargers actually attached to this node;
    /// every other node also receives the broadcast and silently ignores it.
    async fn handle(&self, envelope: RelayEnvelope) {
        if !self.session_registry.is_connected(&envelope.charger_id) {
            return;
        }

        let result = self
            .command_sender
            .send_command(&envelope.charger_id, &envelope.action, envelope.payload.clone(), envelope.timeout_secs)
            .await;

        let payload = match result {
            Ok(v) => v,
            Err(e) => serde_json::json!({ "error": e.code(), "message": e.to_string() }),
        };

        if let Err(e) = self.relay.publish_response(&envelope.message_id, envelope.timeout_secs, &payload).await {
            warn!(
                charger_id = %envelope.charger_id,
                message_id = %envelope.message_id,
                error = %e,
                "failed to publish relay response"
            );
        }
    }
}
