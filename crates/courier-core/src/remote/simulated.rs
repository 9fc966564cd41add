//! In-process stand-in for the remote

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{RemoteApi, RemoteError, RemoteResult};
use crate::connectivity::Connectivity;
use crate::models::SyncOperation;

pub const DEFAULT_SIMULATED_LATENCY: Duration = Duration::from_millis(600);

/// Accepts every operation after a fixed latency, failing while offline.
pub struct SimulatedRemote {
    connectivity: Arc<dyn Connectivity>,
    latency: Duration,
}

impl SimulatedRemote {
    pub fn new(connectivity: Arc<dyn Connectivity>) -> Self {
        Self {
            connectivity,
            latency: DEFAULT_SIMULATED_LATENCY,
        }
    }

    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl RemoteApi for SimulatedRemote {
    async fn push(&self, operation: &SyncOperation) -> RemoteResult<()> {
        if !self.connectivity.is_online().await {
            return Err(RemoteError::Offline);
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if let SyncOperation::DeleteOrder(payload) = operation {
            tracing::debug!("Simulated remote ignores delete of {}", payload.order_id);
        } else {
            tracing::debug!(
                "Simulated remote accepted {} for {}",
                operation.kind(),
                operation.order_id()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::{ConnectivityMonitor, NetworkState};
    use crate::models::{CreateOrderPayload, OrderId};

    fn create_op() -> SyncOperation {
        SyncOperation::CreateOrder(CreateOrderPayload {
            order_id: OrderId::new(),
            code: "ORD-1".to_string(),
            at: 1,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn accepts_after_latency_when_online() {
        let monitor = Arc::new(ConnectivityMonitor::new(NetworkState::online()));
        let remote = SimulatedRemote::new(monitor);

        let started = tokio::time::Instant::now();
        remote.push(&create_op()).await.unwrap();
        assert!(started.elapsed() >= DEFAULT_SIMULATED_LATENCY);
    }

    #[tokio::test]
    async fn fails_while_offline() {
        let monitor = Arc::new(ConnectivityMonitor::new(NetworkState::offline()));
        let remote = SimulatedRemote::new(monitor).with_latency(Duration::ZERO);

        let result = remote.push(&create_op()).await;
        assert!(matches!(result, Err(RemoteError::Offline)));
    }
}
