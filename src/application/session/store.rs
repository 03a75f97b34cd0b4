//! Volatile per-charger protocol state (spec.md §3 `Session`).
//!
//! Distinct from the connection registry: this tracks authorization,
//! transaction/order pairing and the live meter reading, not transport
//! handles.

use std::sync::Arc;

use dashmap::DashMap;

use crate::domain::session::Session;

pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

pub type SharedSessionStore = Arc<SessionStore>;

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn shared() -> SharedSessionStore {
        Arc::new(Self::new())
    }

    pub fn snapshot(&self, charger_id: &str) -> Session {
        self.sessions
            .entry(charger_id.to_string())
            .or_default()
            .clone()
    }

    /// Mutate the session for a charger atomically, creating one if absent.
    pub fn mutate<R>(&self, charger_id: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut entry = self.sessions.entry(charger_id.to_string()).or_default();
        f(&mut entry)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
