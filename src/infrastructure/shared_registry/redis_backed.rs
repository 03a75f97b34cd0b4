//! Redis-backed `SharedRegistry` (spec.md §6), grounded on the original
//! `DistributedConnectionManager`: one key per charger,
//! `ocpp:connection:<charger_id>` holding the owning node id, refreshed
//! with a 1 hour TTL on every announce so a crashed node's claims expire
//! on their own instead of needing explicit cleanup.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::SharedRegistry;
use crate::support::errors::CsmsError;
use crate::support::errors::CsmsResult;

const CONNECTION_TTL_SECS: u64 = 3600;
const KEY_PREFIX: &str = "ocpp:connection:";

pub struct RedisSharedRegistry {
    conn: ConnectionManager,
    node_id: String,
}

impl RedisSharedRegistry {
    pub async fn connect(redis_url: &str, node_id: impl Into<String>) -> CsmsResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CsmsError::Transient(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| CsmsError::Transient(format!("redis connect failed: {e}")))?;
        Ok(Self { conn, node_id: node_id.into() })
    }

    fn key(charger_id: &str) -> String {
        format!("{KEY_PREFIX}{charger_id}")
    }
}

#[async_trait]
impl SharedRegistry for RedisSharedRegistry {
    async fn announce(&self, charger_id: &str) -> CsmsResult<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(Self::key(charger_id), &self.node_id, CONNECTION_TTL_SECS)
            .await
            .map_err(|e| CsmsError::Transient(format!("redis announce failed: {e}")))
    }

    async fn withdraw(&self, charger_id: &str) -> CsmsResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(Self::key(charger_id))
            .await
            .map_err(|e| CsmsError::Transient(format!("redis withdraw failed: {e}")))
    }

    async fn owner(&self, charger_id: &str) -> CsmsResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(Self::key(charger_id))
            .await
            .map_err(|e| CsmsError::Transient(format!("redis owner lookup failed: {e}")))
    }

    fn node_id(&self) -> &str {
        &self.node_id
    }
}
