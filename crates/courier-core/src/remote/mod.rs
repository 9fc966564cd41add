//! The remote system of record
//!
//! The sync engine only needs to know whether the remote accepted an
//! operation. Remote implementations must treat replays of an already applied
//! operation as success: an operation confirmed remotely may be sent again if
//! the process dies before the local commit that records the confirmation.

mod http;
mod simulated;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::SyncOperation;

pub use http::HttpRemote;
pub use simulated::SimulatedRemote;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote unreachable: device is offline")]
    Offline,
    #[error("Remote call timed out after {0:?}")]
    Timeout(Duration),
    #[error("Remote HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote rejected operation with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Delivers queued operations to the remote
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Apply one operation remotely. `Ok` means the remote has it.
    async fn push(&self, operation: &SyncOperation) -> RemoteResult<()>;
}
