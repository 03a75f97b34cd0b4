//! Publish/subscribe transport adapter (spec.md §4.2), grounded on
//! `original_source/app/ocpp/transport/mqtt_adapter.py`'s `MQTTAdapter`.
//!
//! Topic assignment follows spec.md rather than the original adapter (whose
//! `send_message` publishes outbound traffic onto the charger's own
//! `requests` topic): `ocpp/<chargerID>/requests` is charger→CSMS,
//! `ocpp/<chargerID>/responses` is CSMS→charger and CSMS-initiated calls.
//! Frames carry the same message-id-correlated wire framing as the socket
//! adapter so `CommandSender` can await a reply the same way on every
//! carrier.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tracing::{error, info, warn};

use crate::application::commands::SharedCommandSender;
use crate::application::dispatcher::{self, Services};
use crate::application::session::{OutboundChannel, TransportKind};
use crate::support::errors::{CsmsError, CsmsResult};
use crate::support::ocpp_frame::OcppFrame;
use crate::support::shutdown::ShutdownSignal;

const REQUEST_TOPIC_FILTER: &str = "ocpp/+/requests";
/// A charger counts as "connected" after its first observed request within
/// this window (spec.md §4.2: "connected after its first observed request
/// within a session window"). MQTT gives us no disconnect signal, so this
/// is the only liveness proxy available to this carrier.
const SESSION_WINDOW_SECS: i64 = 300;

fn response_topic(charger_id: &str) -> String {
    format!("ocpp/{charger_id}/responses")
}

struct MqttChannel {
    charger_id: String,
    client: AsyncClient,
}

#[async_trait]
impl OutboundChannel for MqttChannel {
    async fn send(&self, frame: String) -> CsmsResult<()> {
        self.client
            .publish(response_topic(&self.charger_id), QoS::AtLeastOnce, false, frame)
            .await
            .map_err(|e| CsmsError::Transient(format!("mqtt publish failed: {e}")))
    }
}

pub struct PubsubTransport {
    client: AsyncClient,
    services: Services,
    command_sender: SharedCommandSender,
    session_registry: crate::application::session::SharedSessionRegistry,
    last_seen: DashMap<String, DateTime<Utc>>,
}

impl PubsubTransport {
    pub fn new(
        broker_host: &str,
        broker_port: u16,
        node_id: &str,
        services: Services,
        command_sender: SharedCommandSender,
        session_registry: crate::application::session::SharedSessionRegistry,
    ) -> (Arc<Self>, rumqttc::EventLoop) {
        let client_id = format!("csms-{node_id}");
        let mut options = MqttOptions::new(client_id, broker_host, broker_port);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, eventloop) = AsyncClient::new(options, 64);
        let transport = Arc::new(Self {
            client,
            services,
            command_sender,
            session_registry,
            last_seen: DashMap::new(),
        });
        (transport, eventloop)
    }

    pub fn is_connected(&self, charger_id: &str) -> bool {
        self.last_seen
            .get(charger_id)
            .map(|t| Utc::now() - *t < ChronoDuration::seconds(SESSION_WINDOW_SECS))
            .unwrap_or(false)
    }

    /// Subscribes and drives the MQTT event loop until shutdown. Spawned
    /// once at startup; inbound publishes are dispatched onto their own
    /// task so a slow handler never stalls the poll loop.
    pub async fn run(self: Arc<Self>, mut eventloop: rumqttc::EventLoop, shutdown: ShutdownSignal) -> CsmsResult<()> {
        self.client
            .subscribe(REQUEST_TOPIC_FILTER, QoS::AtLeastOnce)
            .await
            .map_err(|e| CsmsError::Transient(format!("mqtt subscribe failed: {e}")))?;
        info!(filter = REQUEST_TOPIC_FILTER, "pubsub transport subscribed");

        loop {
            tokio::select! {
                polled = eventloop.poll() => {
                    match polled {
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            let transport = self.clone();
                            tokio::spawn(async move {
                                transport.handle_publish(&publish.topic, &publish.payload).await;
                            });
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!(error = %e, "mqtt event loop error, retrying");
                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }
                    }
                }
                _ = shutdown.notified().wait() => {
                    info!("pubsub transport shutting down");
                    return Ok(());
                }
            }
        }
    }

    async fn handle_publish(&self, topic: &str, payload: &[u8]) {
        let Some(charger_id) = parse_request_topic(topic) else {
            warn!(topic, "ignoring publish on unrecognized topic");
            return;
        };

        let text = match std::str::from_utf8(payload) {
            Ok(t) => t,
            Err(e) => {
                warn!(charger_id, error = %e, "mqtt payload is not valid utf8");
                return;
            }
        };

        let frame = match OcppFrame::parse(text) {
            Ok(f) => f,
            Err(e) => {
                warn!(charger_id, error = %e, "discarding malformed mqtt OCPP frame");
                return;
            }
        };

        self.last_seen.insert(charger_id.clone(), Utc::now());
        self.session_registry.attach(
            &charger_id,
            Arc::new(MqttChannel { charger_id: charger_id.clone(), client: self.client.clone() }),
            TransportKind::Pubsub,
        );

        match frame {
            OcppFrame::Call { unique_id, action, payload } => {
                let result = dispatcher::dispatch(&self.services, &charger_id, &action, payload).await;
                let response = OcppFrame::CallResult { unique_id, payload: result }.serialize();
                if let Err(e) = self
                    .client
                    .publish(response_topic(&charger_id), QoS::AtLeastOnce, false, response)
                    .await
                {
                    error!(charger_id, error = %e, "failed to publish mqtt response");
                }
            }
            OcppFrame::CallResult { unique_id, payload } => {
                self.command_sender.handle_response(&charger_id, &unique_id, payload);
            }
            OcppFrame::CallError { unique_id, error_code, error_description, .. } => {
                self.command_sender.handle_error(&charger_id, &unique_id, &error_code, &error_description);
            }
        }
    }
}

/// `ocpp/<chargerID>/requests` -> `<chargerID>`.
fn parse_request_topic(topic: &str) -> Option<String> {
    let mut parts = topic.split('/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("ocpp"), Some(charger_id), Some("requests"), None) if !charger_id.is_empty() => {
            Some(charger_id.to_string())
        }
        _ => None,
    }
}
