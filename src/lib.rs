//! # OCPP 1.6J Charging Station Management System — core
//!
//! The protocol mediation core of a CSMS: multi-transport front-end
//! (WebSocket, HTTP pull, MQTT pub/sub), per-charger connection registry
//! and session state machine, transaction/order lifecycle, remote-command
//! dispatcher, and optional horizontal sharding via a shared registry and
//! cross-node relay. See `SPEC_FULL.md` and `DESIGN.md` for the full
//! requirements and grounding ledger.
//!
//! ## Layout
//!
//! - **support**: cross-cutting utilities (error taxonomy, OCPP-J framing,
//!   shutdown signal, id/time helpers)
//! - **domain**: entities, value objects, and repository traits; no
//!   dependency on sea-orm, axum, or any transport crate
//! - **application**: use-case orchestration (dispatcher/handlers, session
//!   registry, command layer, history recorder, admin-facing services)
//! - **infrastructure**: external concerns (sea-orm persistence, the
//!   distributed shared registry and cross-node relay)
//! - **interfaces**: delivery mechanisms (the three OCPP transports, the
//!   minimal admin HTTP surface)
//! - **config**: TOML-based application configuration

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod support;
