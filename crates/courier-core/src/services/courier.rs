//! Service wrapper that wires the store, connectivity, remote and sync engine.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CourierConfig;
use crate::connectivity::{Connectivity, ConnectivityMonitor, HttpReachabilityProbe};
use crate::db::{Database, OrderRepository, SqliteOrderRepository, SyncQueueRepository};
use crate::error::{Error, Result};
use crate::models::{
    NewOrder, Order, OrderDetail, OrderId, OrderItem, OrderStatus, StoredQueueItem,
};
use crate::remote::{HttpRemote, RemoteApi, SimulatedRemote};
use crate::state::SyncState;
use crate::sync::{AutoSync, Subscription, SyncEngine, SyncStatus};

/// Thread-safe entry point for order capture and synchronization.
///
/// Cloning is cheap; clones share the store, the connectivity monitor and the
/// sync engine, and therefore its single-flight guard.
#[derive(Clone)]
pub struct CourierService {
    db: Arc<Database>,
    connectivity: Arc<ConnectivityMonitor>,
    status: SyncStatus,
    engine: Arc<SyncEngine>,
    debounce: Duration,
}

impl CourierService {
    /// Open the file-backed store named by `config.db_path`.
    pub fn open(config: &CourierConfig) -> Result<Self> {
        let path = config
            .db_path
            .as_deref()
            .ok_or_else(|| Error::Config("no database path configured".to_string()))?;
        Self::open_path(path, config)
    }

    /// Open the store at `path`, ignoring `config.db_path`.
    pub fn open_path(path: &Path, config: &CourierConfig) -> Result<Self> {
        let db = Database::open(path)?;
        tracing::info!("Opened order store at {}", path.display());
        Self::with_database(db, config)
    }

    /// Open an in-memory store (primarily for tests).
    pub fn open_in_memory(config: &CourierConfig) -> Result<Self> {
        Self::with_database(Database::open_in_memory()?, config)
    }

    fn with_database(db: Database, config: &CourierConfig) -> Result<Self> {
        config.validate()?;

        let mut monitor = ConnectivityMonitor::default();
        if let Some(url) = &config.reachability_url {
            let probe = HttpReachabilityProbe::new(url.clone(), config.probe_timeout())?;
            monitor = monitor.with_probe(Arc::new(probe));
        }
        let monitor = Arc::new(monitor);

        let remote: Arc<dyn RemoteApi> = match &config.remote_url {
            Some(url) => {
                let remote = HttpRemote::new(url.clone(), config.remote_timeout())?;
                tracing::info!("Syncing to {}", remote.endpoint());
                Arc::new(remote)
            }
            None => {
                tracing::debug!("No remote configured; using simulated remote");
                Arc::new(
                    SimulatedRemote::new(monitor.clone())
                        .with_latency(config.simulated_latency()),
                )
            }
        };

        Ok(Self::from_parts(db, monitor, remote, config))
    }

    /// Assemble a service from explicit parts.
    pub fn from_parts(
        db: Database,
        connectivity: Arc<ConnectivityMonitor>,
        remote: Arc<dyn RemoteApi>,
        config: &CourierConfig,
    ) -> Self {
        let db = Arc::new(db);
        let status = SyncStatus::new();
        let engine = SyncEngine::new(
            Arc::clone(&db),
            remote,
            connectivity.clone(),
            status.clone(),
        )
        .with_remote_timeout(config.remote_timeout());

        Self {
            db,
            connectivity,
            status,
            engine: Arc::new(engine),
            debounce: config.debounce(),
        }
    }

    pub async fn create_order(&self, code: &str) -> Result<Order> {
        let conn = self.db.connection().await;
        SqliteOrderRepository::new(&conn).create(&NewOrder::new(code))
    }

    pub async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order> {
        let conn = self.db.connection().await;
        SqliteOrderRepository::new(&conn).update_status(id, status)
    }

    pub async fn delete_order(&self, id: &OrderId) -> Result<()> {
        let conn = self.db.connection().await;
        SqliteOrderRepository::new(&conn).delete(id)
    }

    pub async fn delete_orders(&self, ids: &[OrderId]) -> Result<usize> {
        let conn = self.db.connection().await;
        SqliteOrderRepository::new(&conn).delete_many(ids)
    }

    pub async fn get_order(&self, id: &OrderId) -> Result<Option<OrderDetail>> {
        let conn = self.db.connection().await;
        SqliteOrderRepository::new(&conn).get(id)
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        let conn = self.db.connection().await;
        SqliteOrderRepository::new(&conn).list()
    }

    pub async fn add_item(&self, order_id: &OrderId, name: &str, qty: i64) -> Result<OrderItem> {
        let conn = self.db.connection().await;
        SqliteOrderRepository::new(&conn).add_item(order_id, name, qty)
    }

    pub async fn seed_if_empty(&self) -> Result<bool> {
        let conn = self.db.connection().await;
        SqliteOrderRepository::new(&conn).seed_if_empty()
    }

    pub async fn pending_count(&self) -> Result<usize> {
        let conn = self.db.connection().await;
        SyncQueueRepository::new(&conn).pending_count()
    }

    /// Queue entries in replay order, as stored.
    ///
    /// Rows are returned undecoded so that an entry with a corrupt payload,
    /// which blocks every later entry, is still listed.
    pub async fn queue_entries(
        &self,
        limit: usize,
        pending_only: bool,
    ) -> Result<Vec<StoredQueueItem>> {
        let conn = self.db.connection().await;
        SyncQueueRepository::new(&conn).list(limit, pending_only)
    }

    /// Drain the sync queue now. See [`SyncEngine::process_sync_queue`].
    pub async fn process_sync_queue(&self) -> usize {
        self.engine.process_sync_queue().await
    }

    /// Drain automatically whenever connectivity settles online.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_auto_sync<F>(&self, on_synced: F) -> AutoSync
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        AutoSync::start(
            Arc::clone(&self.engine),
            self.connectivity.subscribe(),
            self.debounce,
            on_synced,
        )
    }

    /// Quiet period auto-sync waits for after the last online signal
    pub const fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn subscribe_syncing<F>(&self, listener: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.status.subscribe(listener)
    }

    pub fn is_syncing(&self) -> bool {
        self.status.get()
    }

    pub async fn is_online(&self) -> bool {
        self.connectivity.is_online().await
    }

    pub async fn sync_state(&self) -> Result<SyncState> {
        let syncing = self.status.get();
        let online = self.is_online().await;
        let pending = self.pending_count().await?;
        Ok(SyncState::resolve(syncing, online, pending))
    }

    /// The connectivity monitor, for injecting platform signals.
    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db.path()
    }
}
