//! Cross-node command relay (spec.md §4.4), grounded on the original
//! `MessageRouter`: a routed envelope travels over Redis pub/sub, the
//! response travels back over a polled, TTL'd response key.

mod null;
mod redis_backed;

pub use null::NullRelay;
pub use redis_backed::RedisRelay;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::support::errors::CsmsResult;

/// One relayed remote-command call, published on `ocpp:route:<charger_id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayEnvelope {
    pub message_id: String,
    pub charger_id: String,
    pub action: String,
    pub payload: Value,
    pub from_node: String,
    pub timeout_secs: u64,
}

#[async_trait]
pub trait Relay: Send + Sync {
    /// Publish a relay envelope for the node that owns `envelope.charger_id`.
    async fn publish_route(&self, envelope: &RelayEnvelope) -> CsmsResult<()>;

    /// Poll the response key for `message_id` until it appears or
    /// `timeout_secs` elapses, then return `Timeout`.
    async fn await_response(&self, message_id: &str, timeout_secs: u64) -> CsmsResult<Value>;

    /// Write back the result of a relayed call this node executed locally.
    async fn publish_response(&self, message_id: &str, timeout_secs: u64, payload: &Value) -> CsmsResult<()>;

    /// Start listening for incoming routed envelopes on `ocpp:route:*`.
    /// The receiver yields every envelope published by any node, including
    /// this one's own publishes — callers filter by local attachment.
    async fn subscribe_routes(&self) -> CsmsResult<mpsc::Receiver<RelayEnvelope>>;
}
