//! No-op `SharedRegistry` used when distributed mode is disabled
//! (spec.md §6: single-node deployments never touch Redis).

use async_trait::async_trait;

use super::SharedRegistry;
use crate::support::errors::CsmsResult;

pub struct NullSharedRegistry {
    node_id: String,
}

impl NullSharedRegistry {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self { node_id: node_id.into() }
    }
}

#[async_trait]
impl SharedRegistry for NullSharedRegistry {
    async fn announce(&self, _charger_id: &str) -> CsmsResult<()> {
        Ok(())
    }

    async fn withdraw(&self, _charger_id: &str) -> CsmsResult<()> {
        Ok(())
    }

    /// Never anyone else's — without Redis every charger is either local
    /// or not connected at all.
    async fn owner(&self, _charger_id: &str) -> CsmsResult<Option<String>> {
        Ok(None)
    }

    fn node_id(&self) -> &str {
        &self.node_id
    }
}
