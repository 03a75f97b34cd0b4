//! Infrastructure layer: external concerns (persistence, distributed state).

pub mod database;
pub mod relay;
pub mod shared_registry;

pub use database::{init_database, DatabaseConfig};
