pub mod config;
pub mod database;
pub mod keycap_repository;
pub mod snapshot_repository;

pub use config::DatabaseConfig;
pub use database::Database;
pub use keycap_repository::KeycapRepository;
pub use snapshot_repository::{SnapshotRepository, SnapshotSummary};
