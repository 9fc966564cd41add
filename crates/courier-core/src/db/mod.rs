//! Durable store for Courier

mod connection;
mod migrations;
mod repository;
mod sync_queue;

pub use connection::{schema_version, set_schema_version, with_transaction, Database};
pub use migrations::{latest_version, Migration, MIGRATIONS};
pub use repository::{OrderRepository, SqliteOrderRepository};
pub use sync_queue::SyncQueueRepository;
