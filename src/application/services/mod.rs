//! Admin-facing service layer (ambient orchestration, not a spec.md
//! component in its own right): the facade the minimal HTTP surface and the
//! background heartbeat monitor call through, grounded on the teacher's
//! `application/services/charge_point.rs` and `heartbeat_monitor.rs`,
//! trimmed to the operations the core actually needs.

mod charge_point;
mod heartbeat_monitor;

pub use charge_point::ChargePointService;
pub use heartbeat_monitor::{HeartbeatMonitor, HeartbeatMonitorConfig};
