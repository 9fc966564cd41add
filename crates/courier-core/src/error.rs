//! Error types for courier-core

use thiserror::Error;

/// Result type alias using courier-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in courier-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// The persisted schema is newer than any migration this build knows.
    /// Unrecoverable: the store must not be opened.
    #[error("Store schema v{persisted} is newer than the latest known migration v{known}")]
    StoreNewerThanCode { persisted: i64, known: i64 },

    /// A migration failed and was rolled back; the schema version was not advanced
    #[error("Migration to v{version} failed: {source}")]
    Migration {
        version: i64,
        #[source]
        source: rusqlite::Error,
    },

    /// A write transaction failed and was rolled back
    #[error("Transaction '{operation}' rolled back: {source}")]
    Transaction {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// SQLite error outside a write transaction
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Order not found
    #[error("Order not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error should abort process startup rather than be retried.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::StoreNewerThanCode { .. } | Self::Migration { .. })
    }
}
