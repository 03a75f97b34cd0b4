//! Transport adapters (spec.md §4.2): the three OCPP carriers, each
//! normalizing inbound bytes to a `(charger_id, action, payload)` call
//! into the shared dispatcher and handler table.
//!
//! There is no separate `TransportManager` struct: with this core's
//! single-active-connection-per-charger model (spec.md §4.1), whichever
//! carrier currently holds a charger's `Connection` in
//! `application::session::SessionRegistry` is, by construction, the only
//! one capable of a synchronous send — so the resolution order spec.md
//! §4.2 describes (preferred -> pubsub -> socket -> pull) collapses to
//! "ask the registry, then fall back to the pull queue", which is exactly
//! what `application::commands::CommandDispatcher::send` already does.

pub mod pubsub;
pub mod pull;
pub mod socket;
