//! Shared sync state summary for front ends.

use std::fmt;

/// What a client should show about synchronization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    Offline,
    Syncing,
    /// Online with this many queued operations not yet confirmed
    Pending(usize),
    Synced,
}

impl SyncState {
    /// Derive the state. A running drain takes precedence over connectivity.
    pub const fn resolve(syncing: bool, online: bool, pending: usize) -> Self {
        if syncing {
            Self::Syncing
        } else if !online {
            Self::Offline
        } else if pending > 0 {
            Self::Pending(pending)
        } else {
            Self::Synced
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offline => f.write_str("offline"),
            Self::Syncing => f.write_str("syncing"),
            Self::Pending(count) => write!(f, "{count} pending"),
            Self::Synced => f.write_str("synced"),
        }
    }
}
