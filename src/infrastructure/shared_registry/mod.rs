//! Shared (cross-node) connection registry (spec.md §4.4/§6).
//!
//! Generalizes the teacher's local-only `SessionRegistry` to distributed
//! deployments: when a charger is attached locally, its owning node is also
//! published here so another node can relay a command to it instead of
//! rejecting with `ChargerNotConnected`.

mod null;
mod redis_backed;

pub use null::NullSharedRegistry;
pub use redis_backed::RedisSharedRegistry;

use async_trait::async_trait;

use crate::support::errors::CsmsResult;

/// Cross-node view of where a charger is currently attached.
#[async_trait]
pub trait SharedRegistry: Send + Sync {
    /// Publish that `charger_id` is now attached to this node, refreshing
    /// its TTL. Called on attach and on every heartbeat/touch.
    async fn announce(&self, charger_id: &str) -> CsmsResult<()>;

    /// Remove this node's claim on `charger_id`. Called on detach.
    async fn withdraw(&self, charger_id: &str) -> CsmsResult<()>;

    /// Which node (if any) currently owns `charger_id`, per the shared store.
    async fn owner(&self, charger_id: &str) -> CsmsResult<Option<String>>;

    /// This node's id, used to tell "owned locally" from "owned remotely".
    fn node_id(&self) -> &str;
}
