//! Connectivity oracle
//!
//! A device counts as online when it is attached to a network and internet
//! reachability is not positively known to be false. Unknown reachability is
//! treated as online so that platforms unable to determine it still sync.

mod probe;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

pub use probe::{HttpReachabilityProbe, ReachabilityProbe};

/// A network-state signal as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkState {
    /// Link-level attachment (Wi-Fi associated, cellular registered, ...)
    pub connected: bool,
    /// Whether a route to the internet exists; `None` when undetermined
    pub internet_reachable: Option<bool>,
}

impl NetworkState {
    pub const fn online() -> Self {
        Self {
            connected: true,
            internet_reachable: Some(true),
        }
    }

    pub const fn offline() -> Self {
        Self {
            connected: false,
            internet_reachable: Some(false),
        }
    }

    /// Attached, but e.g. behind a captive portal
    pub const fn unreachable() -> Self {
        Self {
            connected: true,
            internet_reachable: Some(false),
        }
    }

    pub const fn is_online(&self) -> bool {
        self.connected && !matches!(self.internet_reachable, Some(false))
    }
}

impl Default for NetworkState {
    fn default() -> Self {
        Self {
            connected: true,
            internet_reachable: None,
        }
    }
}

/// Answers "is the remote reachable right now"
#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Single source of truth for connectivity.
///
/// Platform signals are injected with [`ConnectivityMonitor::report`] and
/// fanned out to subscribers, which is how the auto-sync scheduler learns
/// about connectivity changes.
pub struct ConnectivityMonitor {
    state: watch::Sender<NetworkState>,
    probe: Option<Arc<dyn ReachabilityProbe>>,
}

impl ConnectivityMonitor {
    pub fn new(initial: NetworkState) -> Self {
        let (state, _) = watch::channel(initial);
        Self { state, probe: None }
    }

    /// Consult `probe` whenever reachability is unknown
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn ReachabilityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Last reported state
    pub fn current(&self) -> NetworkState {
        *self.state.borrow()
    }

    /// Publish a new platform signal to all subscribers.
    pub fn report(&self, state: NetworkState) {
        let previous = self.state.send_replace(state);
        if previous.is_online() != state.is_online() {
            tracing::info!(
                "Connectivity changed: {}",
                if state.is_online() { "online" } else { "offline" }
            );
        } else {
            tracing::debug!("Connectivity signal: {state:?}");
        }
    }

    /// Receive every subsequent [`report`](Self::report).
    pub fn subscribe(&self) -> watch::Receiver<NetworkState> {
        self.state.subscribe()
    }

    /// Run the reachability probe (if any) and publish the result.
    pub async fn refresh(&self) -> NetworkState {
        let mut state = self.current();
        if let Some(probe) = &self.probe {
            state.internet_reachable = if state.connected {
                probe.probe().await
            } else {
                Some(false)
            };
            self.report(state);
        }
        state
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(NetworkState::default())
    }
}

#[async_trait]
impl Connectivity for ConnectivityMonitor {
    async fn is_online(&self) -> bool {
        let state = self.current();
        if !state.connected {
            return false;
        }
        match (state.internet_reachable, &self.probe) {
            (Some(reachable), _) => reachable,
            (None, Some(probe)) => probe.probe().await != Some(false),
            (None, None) => true,
        }
    }
}
