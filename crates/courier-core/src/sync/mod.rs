//! Queue replay against the remote
//!
//! [`SyncEngine`] drains the pending queue in FIFO order, [`AutoSync`]
//! triggers drains when connectivity returns and [`SyncStatus`] tells
//! observers whether a drain is running.

mod engine;
mod scheduler;
mod status;

pub use engine::{SyncEngine, DEFAULT_REMOTE_TIMEOUT};
pub use scheduler::{AutoSync, DEFAULT_DEBOUNCE};
pub use status::{Subscription, SyncStatus};

#[cfg(test)]
mod test_support;
