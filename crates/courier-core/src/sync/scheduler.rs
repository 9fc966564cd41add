//! Debounced auto-sync

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::engine::SyncEngine;
use crate::connectivity::NetworkState;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Background task that drains the queue after connectivity settles online.
///
/// Every online signal (re)arms a timer; the drain runs once the timer
/// expires without another online signal, so a burst of signals yields one
/// drain timed from the last of them. Offline signals leave an armed timer
/// alone; the drain itself re-checks connectivity. Dropping the handle or
/// calling [`AutoSync::stop`] stops scheduling further drains. A drain that
/// already started runs to completion.
pub struct AutoSync {
    task: JoinHandle<()>,
}

impl AutoSync {
    /// Start watching `events`. `on_synced` is called with the count after
    /// every drain that synced at least one entry.
    ///
    /// If the current state is already online a drain is scheduled right away.
    pub fn start<F>(
        engine: Arc<SyncEngine>,
        events: watch::Receiver<NetworkState>,
        debounce: Duration,
        on_synced: F,
    ) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        let task = tokio::spawn(run(engine, events, debounce, Arc::new(on_synced)));
        Self { task }
    }

    pub fn stop(self) {}

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for AutoSync {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<F>(
    engine: Arc<SyncEngine>,
    mut events: watch::Receiver<NetworkState>,
    debounce: Duration,
    on_synced: Arc<F>,
) where
    F: Fn(usize) + Send + Sync + 'static,
{
    let mut deadline = events
        .borrow_and_update()
        .is_online()
        .then(|| Instant::now() + debounce);

    loop {
        tokio::select! {
            changed = events.changed() => {
                if changed.is_err() {
                    tracing::debug!("Connectivity source closed; auto-sync stopped");
                    break;
                }
                if events.borrow_and_update().is_online() {
                    tracing::debug!("Online signal; sync scheduled in {debounce:?}");
                    deadline = Some(Instant::now() + debounce);
                }
            }
            () = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                let engine = Arc::clone(&engine);
                let on_synced = Arc::clone(&on_synced);
                tokio::spawn(async move {
                    let synced = engine.process_sync_queue().await;
                    if synced > 0 {
                        on_synced(synced);
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::ConnectivityMonitor;
    use crate::db::{Database, OrderRepository, SqliteOrderRepository, SyncQueueRepository};
    use crate::models::NewOrder;
    use crate::sync::status::SyncStatus;
    use crate::sync::test_support::RecordingRemote;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Fixture {
        db: Arc<Database>,
        monitor: Arc<ConnectivityMonitor>,
        engine: Arc<SyncEngine>,
        drains: Arc<AtomicUsize>,
        _subscription: crate::sync::Subscription,
    }

    async fn fixture(initial: NetworkState) -> Fixture {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let monitor = Arc::new(ConnectivityMonitor::new(initial));
        let status = SyncStatus::new();
        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&db),
            Arc::new(RecordingRemote::new()),
            monitor.clone(),
            status.clone(),
        ));

        // Each drain that gets past the offline gate raises the flag once
        let drains = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&drains);
        let subscription = status.subscribe(move |syncing| {
            if syncing {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        {
            let conn = db.connection().await;
            SqliteOrderRepository::new(&conn)
                .create(&NewOrder::new("ORD-1"))
                .unwrap();
        }

        Fixture {
            db,
            monitor,
            engine,
            drains,
            _subscription: subscription,
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_online_signals_drains_once_after_last() {
        let f = fixture(NetworkState::offline()).await;
        let synced = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&synced);
        let auto = AutoSync::start(
            Arc::clone(&f.engine),
            f.monitor.subscribe(),
            DEFAULT_DEBOUNCE,
            move |count| sink.lock().unwrap().push(count),
        );
        settle().await;

        for _ in 0..5 {
            f.monitor.report(NetworkState::online());
            settle().await;
            tokio::time::advance(Duration::from_millis(100)).await;
            settle().await;
        }
        assert_eq!(f.drains.load(Ordering::SeqCst), 0);

        // 100ms + 299ms since the last signal
        tokio::time::advance(Duration::from_millis(299)).await;
        settle().await;
        assert_eq!(f.drains.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_millis(2)).await;
        settle().await;
        assert_eq!(f.drains.load(Ordering::SeqCst), 1);
        assert_eq!(*synced.lock().unwrap(), vec![1]);

        let conn = f.db.connection().await;
        assert_eq!(SyncQueueRepository::new(&conn).pending_count().unwrap(), 0);
        drop(conn);
        assert!(auto.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn offline_signals_do_not_schedule() {
        let f = fixture(NetworkState::online()).await;
        f.monitor.report(NetworkState::offline());
        let _auto = AutoSync::start(
            Arc::clone(&f.engine),
            f.monitor.subscribe(),
            DEFAULT_DEBOUNCE,
            |_| {},
        );
        settle().await;

        f.monitor.report(NetworkState::unreachable());
        settle().await;
        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;

        assert_eq!(f.drains.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn starting_online_schedules_a_drain() {
        let f = fixture(NetworkState::online()).await;
        let _auto = AutoSync::start(
            Arc::clone(&f.engine),
            f.monitor.subscribe(),
            DEFAULT_DEBOUNCE,
            |_| {},
        );
        settle().await;
        tokio::time::advance(DEFAULT_DEBOUNCE + Duration::from_millis(1)).await;
        settle().await;

        assert_eq!(f.drains.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_armed_timer() {
        let f = fixture(NetworkState::offline()).await;
        let auto = AutoSync::start(
            Arc::clone(&f.engine),
            f.monitor.subscribe(),
            DEFAULT_DEBOUNCE,
            |_| {},
        );
        settle().await;

        f.monitor.report(NetworkState::online());
        settle().await;
        auto.stop();

        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(f.drains.load(Ordering::SeqCst), 0);
    }
}
