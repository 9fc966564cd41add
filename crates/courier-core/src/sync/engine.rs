//! Queue drain

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use super::status::SyncStatus;
use crate::connectivity::Connectivity;
use crate::db::{with_transaction, Database, SyncQueueRepository};
use crate::error::Result;
use crate::models::{StoredQueueItem, SyncOperation, SyncQueueItem};
use crate::remote::{RemoteApi, RemoteError, RemoteResult};

pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Replays pending queue entries against the remote, oldest first.
///
/// At most one drain runs at a time per engine. A drain stops at the first
/// entry that cannot be delivered so that later entries never overtake it;
/// the next drain resumes from that entry.
pub struct SyncEngine {
    db: Arc<Database>,
    remote: Arc<dyn RemoteApi>,
    connectivity: Arc<dyn Connectivity>,
    status: SyncStatus,
    drain_lock: Mutex<()>,
    remote_timeout: Duration,
}

impl SyncEngine {
    pub fn new(
        db: Arc<Database>,
        remote: Arc<dyn RemoteApi>,
        connectivity: Arc<dyn Connectivity>,
        status: SyncStatus,
    ) -> Self {
        Self {
            db,
            remote,
            connectivity,
            status,
            drain_lock: Mutex::new(()),
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    /// Bound each remote call; a call exceeding it counts as a failure.
    #[must_use]
    pub const fn with_remote_timeout(mut self, remote_timeout: Duration) -> Self {
        self.remote_timeout = remote_timeout;
        self
    }

    pub const fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn is_draining(&self) -> bool {
        self.drain_lock.try_lock().is_err()
    }

    /// Drain the queue. Returns how many entries were confirmed and marked
    /// synced during this call.
    ///
    /// Returns 0 without touching the store or the status flag when a drain is
    /// already running or the device is offline. Failures are logged and leave
    /// the failing entry pending; they are never returned to the caller.
    pub async fn process_sync_queue(&self) -> usize {
        let Ok(_drain) = self.drain_lock.try_lock() else {
            tracing::debug!("Sync drain already in progress");
            return 0;
        };

        if !self.connectivity.is_online().await {
            tracing::debug!("Offline; leaving sync queue pending");
            return 0;
        }

        let _syncing = SyncingFlag::raise(&self.status);
        let synced = self.drain().await;
        if synced > 0 {
            tracing::info!("Synced {synced} queued operation(s)");
        }
        synced
    }

    async fn drain(&self) -> usize {
        let pending = match self.load_pending().await {
            Ok(pending) => pending,
            Err(error) => {
                tracing::warn!("Failed to read sync queue: {error}");
                return 0;
            }
        };

        let total = pending.len();
        let mut synced = 0;
        for stored in pending {
            if !self.connectivity.is_online().await {
                tracing::info!(
                    "Connectivity lost mid-drain; {} operation(s) left pending",
                    total - synced
                );
                break;
            }

            let item = match stored.decode() {
                Ok(item) => item,
                Err(error) => {
                    tracing::warn!("Cannot decode queue entry {}: {error}", stored.id);
                    break;
                }
            };

            if let Err(error) = self.push(&item.operation).await {
                tracing::warn!(
                    "Sync of {} for order {} failed, will retry: {error}",
                    item.operation.kind(),
                    item.operation.order_id()
                );
                break;
            }

            if let Err(error) = self.commit_synced(&item).await {
                tracing::warn!("Failed to record sync of entry {}: {error}", item.id);
                break;
            }
            synced += 1;
        }

        synced
    }

    async fn load_pending(&self) -> Result<Vec<StoredQueueItem>> {
        let conn = self.db.connection().await;
        SyncQueueRepository::new(&conn).pending()
    }

    async fn push(&self, operation: &SyncOperation) -> RemoteResult<()> {
        tokio::time::timeout(self.remote_timeout, self.remote.push(operation))
            .await
            .unwrap_or(Err(RemoteError::Timeout(self.remote_timeout)))
    }

    async fn commit_synced(&self, item: &SyncQueueItem) -> Result<()> {
        let conn = self.db.connection().await;
        with_transaction(&conn, "mark_synced", |tx| {
            SyncQueueRepository::new(tx).mark_synced(item)
        })
    }
}

/// Publishes `true` on creation and `false` on drop, including on unwind.
struct SyncingFlag<'a>(&'a SyncStatus);

impl<'a> SyncingFlag<'a> {
    fn raise(status: &'a SyncStatus) -> Self {
        status.set(true);
        Self(status)
    }
}

impl Drop for SyncingFlag<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
