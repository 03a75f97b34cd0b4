//! SeaORM-backed repository implementations.

pub mod charger_repository;
pub mod history_repository;
pub mod transaction_repository;

pub use charger_repository::SeaOrmChargerRepository;
pub use history_repository::SeaOrmHistoryRepository;
pub use transaction_repository::SeaOrmTransactionRepository;
