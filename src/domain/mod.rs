//! Domain layer: core entities, value objects, and repository traits.
//! No dependency on sea-orm, axum, or any transport crate lives here.

pub mod charger;
pub mod history;
pub mod meter_value;
pub mod repository;
pub mod session;
pub mod transaction;

pub use charger::{Charger, ChargerStatus};
pub use history::{HeartbeatEvent, StatusEvent};
pub use meter_value::MeterValue;
pub use repository::{ChargerRepository, HistoryRepository, TransactionRepository};
pub use session::Session;
pub use transaction::{Order, Transaction, TransactionStatus};
