//! WebSocket transport adapter (spec.md §4.2), grounded directly on the
//! teacher's `interfaces/ws/ocpp_server.rs`. Generalizes the teacher's
//! position-based response correlation into message-id correlation via
//! `OcppFrame` (spec.md §9's framing open question, resolved in favor of
//! option (a)): the send task forwards both inbound dispatcher results and
//! outbound `CommandSender` calls over the same per-charger channel.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info, warn};

use crate::application::commands::SharedCommandSender;
use crate::application::dispatcher::{self, Services};
use crate::application::session::{OutboundChannel, SharedSessionRegistry, TransportKind};
use crate::domain::charger::ChargerStatus;
use crate::infrastructure::shared_registry::SharedRegistry;
use crate::support::errors::{CsmsError, CsmsResult};
use crate::support::ocpp_frame::OcppFrame;
use crate::support::shutdown::ShutdownSignal;

const OCPP_SUBPROTOCOL: &str = "ocpp1.6";
const PING_INTERVAL: Duration = Duration::from_secs(20);
const PONG_DEADLINE: Duration = Duration::from_secs(10);

enum WsOutbound {
    Frame(String),
    Ping,
}

struct WsChannel(mpsc::UnboundedSender<WsOutbound>);

#[async_trait]
impl OutboundChannel for WsChannel {
    async fn send(&self, frame: String) -> CsmsResult<()> {
        self.0
            .send(WsOutbound::Frame(frame))
            .map_err(|_| CsmsError::ChargerNotConnected("socket closed".to_string()))
    }
}

pub struct SocketTransport {
    bind_addr: String,
    session_registry: SharedSessionRegistry,
    services: Services,
    command_sender: SharedCommandSender,
    shared_registry: Arc<dyn SharedRegistry>,
}

impl SocketTransport {
    pub fn new(
        bind_addr: impl Into<String>,
        session_registry: SharedSessionRegistry,
        services: Services,
        command_sender: SharedCommandSender,
        shared_registry: Arc<dyn SharedRegistry>,
    ) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            session_registry,
            services,
            command_sender,
            shared_registry,
        }
    }

    pub async fn run(&self, shutdown: ShutdownSignal) -> CsmsResult<()> {
        let listener = TcpListener::bind(&self.bind_addr)
            .await
            .map_err(|e| CsmsError::Transient(format!("socket bind failed: {e}")))?;
        info!(addr = %self.bind_addr, "socket transport listening, connect at ws://<addr>/ocpp/<charger_id>");

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => self.spawn_connection(stream, addr, shutdown.clone()),
                        Err(e) => error!(error = %e, "failed to accept socket connection"),
                    }
                }
                _ = shutdown.notified().wait() => {
                    info!("socket transport shutting down");
                    return Ok(());
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, addr: SocketAddr, shutdown: ShutdownSignal) {
        let session_registry = self.session_registry.clone();
        let services = self.services.clone();
        let command_sender = self.command_sender.clone();
        let shared_registry = self.shared_registry.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, addr, session_registry, services, command_sender, shared_registry, shutdown).await {
                error!(%addr, error = %e, "socket connection ended with error");
            }
        });
    }
}

/// spec.md §4.2/§6: the charger id travels as the `id` query parameter on
/// `/ocpp?id=<charger_id>`. That's authoritative; a path segment
/// (`/ocpp/<charger_id>`, tolerated for chargers that can't set query
/// strings) is only a fallback.
fn extract_charger_id(uri: &tokio_tungstenite::tungstenite::http::Uri) -> Option<String> {
    if let Some(id) = uri.query().and_then(query_param("id")) {
        if !id.is_empty() {
            return Some(id);
        }
    }

    let path = uri.path().trim_start_matches('/');
    if let Some(id) = path.strip_prefix("ocpp/") {
        let id = id.trim_start_matches('/');
        return (!id.is_empty()).then(|| id.to_string());
    }
    (!path.is_empty() && !path.contains('/')).then(|| path.to_string())
}

/// Looks up `key` in a raw (already-decoded-enough for charger ids) query
/// string of `a=1&b=2` pairs.
fn query_param(key: &str) -> impl Fn(&str) -> Option<String> + '_ {
    move |query: &str| {
        query.split('&').find_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let k = parts.next()?;
            let v = parts.next().unwrap_or("");
            (k == key).then(|| v.to_string())
        })
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    session_registry: SharedSessionRegistry,
    services: Services,
    command_sender: SharedCommandSender,
    shared_registry: Arc<dyn SharedRegistry>,
    shutdown: ShutdownSignal,
) -> CsmsResult<()> {
    let mut charger_id_slot: Option<String> = None;

    let ws_stream = tokio_tungstenite::accept_hdr_async(
        stream,
        |req: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
            let requested = req
                .headers()
                .get("Sec-WebSocket-Protocol")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            if !requested.split(',').map(str::trim).any(|p| p == OCPP_SUBPROTOCOL) {
                warn!(addr = %addr, requested, "rejecting handshake: charger did not offer the ocpp1.6 subprotocol");
                let mut rejection = ErrorResponse::new(Some(
                    "missing required ocpp1.6 subprotocol".to_string(),
                ));
                *rejection.status_mut() = StatusCode::BAD_REQUEST;
                return Err(rejection);
            }
            response.headers_mut().insert("Sec-WebSocket-Protocol", OCPP_SUBPROTOCOL.parse().unwrap());
            charger_id_slot = extract_charger_id(req.uri());
            Ok(response)
        },
    )
    .await
    .map_err(|e| CsmsError::ProtocolViolation(format!("websocket handshake failed: {e}")))?;

    let charger_id = charger_id_slot.unwrap_or_else(|| format!("CP_{}", addr.port()));
    info!(charger_id, %addr, "charger connected over socket transport");

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsOutbound>();
    let disconnect = Arc::new(Notify::new());
    let pong_received = Arc::new(Notify::new());

    session_registry.attach(&charger_id, Arc::new(WsChannel(tx.clone())), TransportKind::Socket);
    if let Err(e) = shared_registry.announce(&charger_id).await {
        warn!(charger_id, error = %e, "failed to announce socket connection to shared registry");
    }

    let send_task = {
        let charger_id = charger_id.clone();
        tokio::spawn(async move {
            while let Some(out) = rx.recv().await {
                let msg = match out {
                    WsOutbound::Frame(text) => Message::Text(text),
                    WsOutbound::Ping => Message::Ping(Vec::new()),
                };
                if let Err(e) = ws_sender.send(msg).await {
                    error!(charger_id, error = %e, "socket send failed");
                    break;
                }
            }
        })
    };

    let recv_task = {
        let charger_id = charger_id.clone();
        let session_registry = session_registry.clone();
        let services = services.clone();
        let command_sender = command_sender.clone();
        let pong_received = pong_received.clone();
        let disconnect = disconnect.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            while let Some(msg) = ws_receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        session_registry.touch(&charger_id);
                        handle_inbound_frame(&charger_id, &text, &services, &command_sender, &tx).await;
                    }
                    Ok(Message::Pong(_)) => {
                        session_registry.touch(&charger_id);
                        pong_received.notify_one();
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(Message::Binary(data)) => {
                        warn!(charger_id, bytes = data.len(), "ignoring binary frame");
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Frame(_)) => {}
                    Err(e) => {
                        warn!(charger_id, error = %e, "socket read error");
                        break;
                    }
                }
            }
            disconnect.notify_one();
        })
    };

    let ping_task = {
        let charger_id = charger_id.clone();
        let tx = tx.clone();
        let pong_received = pong_received.clone();
        let disconnect = disconnect.clone();
        let services = services.clone();
        let session_registry = session_registry.clone();
        let shared_registry = shared_registry.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PING_INTERVAL);
            interval.tick().await; // first tick fires immediately
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if tx.send(WsOutbound::Ping).is_err() {
                            break;
                        }
                        tokio::select! {
                            _ = pong_received.notified() => {}
                            _ = tokio::time::sleep(PONG_DEADLINE) => {
                                warn!(charger_id, "pong deadline missed, marking offline");
                                mark_offline(&charger_id, &services, &session_registry, &shared_registry).await;
                                disconnect.notify_one();
                                break;
                            }
                        }
                    }
                    _ = disconnect.notified() => break,
                }
            }
        })
    };

    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
        _ = ping_task => {}
        _ = disconnect.notified() => {}
        _ = shutdown.notified().wait() => {
            info!(charger_id, "closing socket connection for server shutdown");
        }
    }

    session_registry.detach(&charger_id);
    command_sender.cleanup_charge_point(&charger_id);
    if let Err(e) = shared_registry.withdraw(&charger_id).await {
        warn!(charger_id, error = %e, "failed to withdraw from shared registry on disconnect");
    }
    info!(charger_id, "charger disconnected from socket transport");

    Ok(())
}

async fn handle_inbound_frame(
    charger_id: &str,
    text: &str,
    services: &Services,
    command_sender: &SharedCommandSender,
    tx: &mpsc::UnboundedSender<WsOutbound>,
) {
    let frame = match OcppFrame::parse(text) {
        Ok(f) => f,
        Err(e) => {
            warn!(charger_id, error = %e, "discarding malformed OCPP frame");
            return;
        }
    };

    match frame {
        OcppFrame::Call { unique_id, action, payload } => {
            let result = dispatcher::dispatch(services, charger_id, &action, payload).await;
            let response = OcppFrame::CallResult { unique_id, payload: result }.serialize();
            let _ = tx.send(WsOutbound::Frame(response));
        }
        OcppFrame::CallResult { unique_id, payload } => {
            command_sender.handle_response(charger_id, &unique_id, payload);
        }
        OcppFrame::CallError { unique_id, error_code, error_description, .. } => {
            command_sender.handle_error(charger_id, &unique_id, &error_code, &error_description);
        }
    }
}

async fn mark_offline(
    charger_id: &str,
    services: &Services,
    session_registry: &SharedSessionRegistry,
    shared_registry: &Arc<dyn SharedRegistry>,
) {
    if let Ok(Some(mut charger)) = services.chargers.find_by_id(charger_id).await {
        charger.set_status(ChargerStatus::Offline);
        if let Err(e) = services.chargers.upsert(&charger).await {
            warn!(charger_id, error = %e, "failed to persist offline transition");
        }
    }
    session_registry.detach(charger_id);
    let _ = shared_registry.withdraw(charger_id).await;
}

#[cfg(test)]
mod charger_id_tests {
    use super::*;
    use tokio_tungstenite::tungstenite::http::Uri;

    #[test]
    fn prefers_the_spec_query_parameter() {
        let uri: Uri = "/ocpp?id=CP001".parse().unwrap();
        assert_eq!(extract_charger_id(&uri).as_deref(), Some("CP001"));
    }

    #[test]
    fn query_parameter_wins_over_a_coincidental_path_segment() {
        let uri: Uri = "/ocpp/other?id=CP001".parse().unwrap();
        assert_eq!(extract_charger_id(&uri).as_deref(), Some("CP001"));
    }

    #[test]
    fn falls_back_to_a_path_segment_when_no_query_is_present() {
        let uri: Uri = "/ocpp/CP002".parse().unwrap();
        assert_eq!(extract_charger_id(&uri).as_deref(), Some("CP002"));
    }

    #[test]
    fn bare_id_path_still_works() {
        let uri: Uri = "/CP003".parse().unwrap();
        assert_eq!(extract_charger_id(&uri).as_deref(), Some("CP003"));
    }

    #[test]
    fn bare_ocpp_path_with_no_query_yields_no_id() {
        let uri: Uri = "/ocpp".parse().unwrap();
        assert_eq!(extract_charger_id(&uri), None);
    }
}
