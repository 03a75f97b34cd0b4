//! Database entities module

pub mod charger;
pub mod heartbeat_event;
pub mod meter_value;
pub mod order;
pub mod status_event;
pub mod transaction;

pub use charger::Entity as Charger;
pub use heartbeat_event::Entity as HeartbeatEvent;
pub use meter_value::Entity as MeterValue;
pub use order::Entity as Order;
pub use status_event::Entity as StatusEvent;
pub use transaction::Entity as Transaction;
