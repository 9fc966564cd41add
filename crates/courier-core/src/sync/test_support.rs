//! Remote test double shared by the sync tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::SyncOperation;
use crate::remote::{RemoteApi, RemoteError, RemoteResult};

/// Records accepted operations and can reject a chosen call.
#[derive(Default)]
pub struct RecordingRemote {
    pushed: Mutex<Vec<SyncOperation>>,
    fail_at: Mutex<Option<usize>>,
    calls: AtomicUsize,
    latency: Duration,
}

impl RecordingRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Reject the call with this zero-based index (counted across all calls).
    pub fn fail_call(&self, index: Option<usize>) {
        *self.fail_at.lock().unwrap() = index;
    }

    pub fn pushed(&self) -> Vec<SyncOperation> {
        self.pushed.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteApi for RecordingRemote {
    async fn push(&self, operation: &SyncOperation) -> RemoteResult<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if *self.fail_at.lock().unwrap() == Some(call) {
            return Err(RemoteError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        self.pushed.lock().unwrap().push(operation.clone());
        Ok(())
    }
}
