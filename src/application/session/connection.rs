//! Transport-agnostic connection handle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::support::errors::CsmsResult;

/// A carrier-specific way of pushing a frame to an attached charger.
/// Implemented once per transport adapter (socket sender, pull FIFO,
/// pubsub publisher) so the registry stays transport-agnostic.
#[async_trait]
pub trait OutboundChannel: Send + Sync {
    async fn send(&self, frame: String) -> CsmsResult<()>;
}

/// Which carrier currently holds a charger's attachment. Since a charger
/// has exactly one active connection at a time in this core's model, this
/// doubles as the "preferred transport" resolution in
/// `TransportManager::send_message` (spec.md §4.2): whichever carrier is
/// attached is, by construction, the only one capable of a synchronous send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Socket,
    Pubsub,
}

pub struct Connection {
    pub channel: Arc<dyn OutboundChannel>,
    pub kind: TransportKind,
    pub connected_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Connection {
    pub fn new(channel: Arc<dyn OutboundChannel>, kind: TransportKind) -> Self {
        let now = Utc::now();
        Self {
            channel,
            kind,
            connected_at: now,
            last_activity: now,
        }
    }
}
