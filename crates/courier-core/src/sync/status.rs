//! Observable "sync in progress" flag

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Listener = Arc<dyn Fn(bool) + Send + Sync>;

/// Broadcasts whether a queue drain is in progress.
///
/// Cloning yields another handle to the same flag.
#[derive(Clone, Default)]
pub struct SyncStatus {
    inner: Arc<StatusInner>,
}

#[derive(Default)]
struct StatusInner {
    syncing: AtomicBool,
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<u64, Listener>>,
}

impl StatusInner {
    fn listeners(&self) -> MutexGuard<'_, BTreeMap<u64, Listener>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SyncStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> bool {
        self.inner.syncing.load(Ordering::SeqCst)
    }

    /// Store `syncing` and notify every listener, in subscription order.
    ///
    /// Listeners run on the caller's thread after the listener table is
    /// released, so a listener may subscribe or unsubscribe.
    pub fn set(&self, syncing: bool) {
        self.inner.syncing.store(syncing, Ordering::SeqCst);
        let listeners: Vec<Listener> = self.inner.listeners().values().cloned().collect();
        for listener in listeners {
            listener(syncing);
        }
    }

    /// Register `listener`. It is called immediately with the current value,
    /// then on every [`set`](Self::set) until the returned handle is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let listener: Listener = Arc::new(listener);
        self.inner.listeners().insert(id, Arc::clone(&listener));
        listener(self.get());

        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners().len()
    }
}

impl fmt::Debug for SyncStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SyncStatus")
            .field("syncing", &self.get())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    inner: Weak<StatusInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.listeners().remove(&self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
