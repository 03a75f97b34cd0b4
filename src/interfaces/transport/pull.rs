//! Request/response (pull) transport adapter (spec.md §4.2), grounded on
//! `original_source/app/ocpp/transport/http_adapter.py`'s `HTTPAdapter`.
//!
//! A pull-transport charger holds no persistent connection: it POSTs inbound
//! frames to us and separately polls for queued outbound commands. There is
//! no synchronous response on this transport, so queueing a command just
//! enqueues it; the eventual response arrives as a later POST whose payload
//! echoes the request id (spec.md line 62).

use std::collections::VecDeque;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::application::commands::{PullQueue, SharedCommandSender};
use crate::application::dispatcher::{self, Services};
use crate::support::id::new_message_id;

/// A charger is considered connected over pull if it has POSTed or GETed
/// within this window (spec.md §4.2's "freshness" heuristic).
pub const FRESHNESS_WINDOW_SECS: i64 = 120;

#[derive(Clone, Serialize)]
struct QueuedCommand {
    #[serde(rename = "requestId")]
    request_id: String,
    action: String,
    payload: Value,
}

/// State shared by the pull HTTP routes and by `CommandDispatcher`'s
/// last-resort queueing path.
pub struct PullTransport {
    queues: Arc<DashMap<String, VecDeque<QueuedCommand>>>,
    last_seen: DashMap<String, DateTime<Utc>>,
    services: Services,
    command_sender: SharedCommandSender,
}

pub type SharedPullTransport = Arc<PullTransport>;

impl PullTransport {
    pub fn new(services: Services, command_sender: SharedCommandSender) -> Self {
        Self {
            queues: Arc::new(DashMap::new()),
            last_seen: DashMap::new(),
            services,
            command_sender,
        }
    }

    pub fn shared(services: Services, command_sender: SharedCommandSender) -> SharedPullTransport {
        Arc::new(Self::new(services, command_sender))
    }

    fn touch(&self, charger_id: &str) {
        self.last_seen.insert(charger_id.to_string(), Utc::now());
    }

    fn pop_pending(&self, charger_id: &str) -> Option<QueuedCommand> {
        self.queues.get_mut(charger_id).and_then(|mut q| q.pop_front())
    }

    /// Has this charger posted or polled recently enough to count as
    /// connected over the pull transport?
    pub fn is_connected(&self, charger_id: &str) -> bool {
        self.last_seen
            .get(charger_id)
            .map(|t| Utc::now() - *t < ChronoDuration::seconds(FRESHNESS_WINDOW_SECS))
            .unwrap_or(false)
    }

    pub fn router(self: &SharedPullTransport) -> Router {
        Router::new()
            .route("/ocpp/{charger_id}", post(handle_post).get(handle_get))
            .with_state(self.clone())
    }
}

impl PullQueue for PullTransport {
    fn enqueue(&self, charger_id: &str, action: &str, payload: Value) -> String {
        let request_id = new_message_id();
        self.queues.entry(charger_id.to_string()).or_default().push_back(QueuedCommand {
            request_id: request_id.clone(),
            action: action.to_string(),
            payload,
        });
        request_id
    }
}

#[derive(Deserialize)]
struct InboundBody {
    action: String,
    #[serde(default)]
    payload: Value,
}

/// If the POST body's payload is the correlated response to a previously
/// queued outbound command, its `requestId` field identifies which one.
fn correlated_request_id(payload: &Value) -> Option<&str> {
    payload.get("requestId").and_then(|v| v.as_str())
}

async fn handle_post(
    State(transport): State<SharedPullTransport>,
    Path(charger_id): Path<String>,
    Json(body): Json<InboundBody>,
) -> Json<Value> {
    transport.touch(&charger_id);

    let response = if let Some(request_id) = correlated_request_id(&body.payload) {
        transport.command_sender.handle_response(&charger_id, request_id, body.payload.clone());
        json!({ "acknowledged": true })
    } else {
        dispatcher::dispatch(&transport.services, &charger_id, &body.action, body.payload).await
    };

    let pending = transport.pop_pending(&charger_id);
    Json(json!({ "response": response, "pending": pending }))
}

async fn handle_get(State(transport): State<SharedPullTransport>, Path(charger_id): Path<String>) -> Json<Value> {
    transport.touch(&charger_id);
    let pending = transport.pop_pending(&charger_id);
    Json(json!({ "pending": pending }))
}
