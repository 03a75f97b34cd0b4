//! Per-charger connection registry (spec.md §4.1, local mode).
//!
//! Generalizes the teacher's single-socket `SessionRegistry` to an
//! `OutboundChannel` trait object so the same registry backs all three
//! transports instead of only the WebSocket adapter.

mod connection;
mod store;

pub use connection::{Connection, OutboundChannel, TransportKind};
pub use store::{SessionStore, SharedSessionStore};

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{info, warn};

/// Outcome of a registration attempt.
pub enum RegisterResult {
    New,
    Evicted,
}

/// Thread-safe registry of locally-attached charger sessions.
pub struct SessionRegistry {
    connections: DashMap<String, Connection>,
}

pub type SharedSessionRegistry = Arc<SessionRegistry>;

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    pub fn shared() -> SharedSessionRegistry {
        Arc::new(Self::new())
    }

    /// Attach a charger to a connection handle, replacing any prior one.
    pub fn attach(&self, charger_id: &str, channel: Arc<dyn OutboundChannel>, kind: TransportKind) -> RegisterResult {
        let evicted = self
            .connections
            .insert(charger_id.to_string(), Connection::new(channel, kind))
            .is_some();

        metrics::gauge!("ocpp_connected_chargers").set(self.connections.len() as f64);

        if evicted {
            warn!(charger_id, "evicting stale session for reconnect");
            RegisterResult::Evicted
        } else {
            info!(charger_id, "charger attached");
            RegisterResult::New
        }
    }

    pub fn detach(&self, charger_id: &str) {
        if self.connections.remove(charger_id).is_some() {
            metrics::gauge!("ocpp_connected_chargers").set(self.connections.len() as f64);
            info!(charger_id, "charger detached");
        }
    }

    pub fn lookup(&self, charger_id: &str) -> Option<Arc<dyn OutboundChannel>> {
        self.connections.get(charger_id).map(|c| c.channel.clone())
    }

    pub fn is_connected(&self, charger_id: &str) -> bool {
        self.connections.contains_key(charger_id)
    }

    /// The transport kind currently holding the charger's attachment, if any.
    pub fn kind_of(&self, charger_id: &str) -> Option<TransportKind> {
        self.connections.get(charger_id).map(|c| c.kind)
    }

    pub fn touch(&self, charger_id: &str) {
        if let Some(mut c) = self.connections.get_mut(charger_id) {
            c.last_activity = Utc::now();
        }
    }

    pub fn list(&self) -> Vec<String> {
        self.connections.iter().map(|r| r.key().clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
