//! courier-core - Core library for Courier
//!
//! This crate contains the order models, the local durable store with its
//! append-only sync queue, and the engine that replays that queue against a
//! remote system of record whenever connectivity allows.

pub mod config;
pub mod connectivity;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod services;
pub mod state;
pub mod sync;
pub mod util;

pub use config::CourierConfig;
pub use error::{Error, Result};
pub use models::{NewOrder, Order, OrderDetail, OrderId, OrderItem, OrderStatus};
pub use services::CourierService;
pub use state::SyncState;
