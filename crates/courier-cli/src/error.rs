use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] courier_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Order ID cannot be empty")]
    EmptyOrderId,
    #[error("Order not found for id/prefix: {0}")]
    OrderNotFound(String),
    #[error("{0}")]
    AmbiguousOrderId(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
