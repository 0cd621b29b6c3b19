//! The slice of cluster state licensing consumes, and the listener seam the
//! host uses to deliver state transitions.
//!
//! The host owns consensus and membership. It hands the coordinator one
//! [`ClusterChangedEvent`] per transition, serially.

use keystone_license::{LicenseKey, LicenseResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Handle returned by [`ClusterStateSource::add_listener`].
pub type ListenerId = u64;

/// An immutable snapshot of the cluster state relevant to licensing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterState {
    cluster_name: String,
    local_node_is_leader: bool,
    state_recovered: bool,
    license: Option<LicenseKey>,
}

impl ClusterState {
    /// A recovered state without a license, seen from a non-leader node.
    pub fn new(cluster_name: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            local_node_is_leader: false,
            state_recovered: true,
            license: None,
        }
    }

    #[must_use]
    pub fn with_leader(mut self, local_node_is_leader: bool) -> Self {
        self.local_node_is_leader = local_node_is_leader;
        self
    }

    #[must_use]
    pub fn with_recovered(mut self, state_recovered: bool) -> Self {
        self.state_recovered = state_recovered;
        self
    }

    #[must_use]
    pub fn with_license(mut self, license: Option<LicenseKey>) -> Self {
        self.license = license;
        self
    }

    #[must_use]
    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    /// Whether this node is the elected leader in this snapshot.
    #[must_use]
    pub fn local_node_is_leader(&self) -> bool {
        self.local_node_is_leader
    }

    /// False until the host has recovered persisted metadata after startup.
    #[must_use]
    pub fn state_recovered(&self) -> bool {
        self.state_recovered
    }

    /// The license stored in cluster metadata, if any.
    #[must_use]
    pub fn license(&self) -> Option<&LicenseKey> {
        self.license.as_ref()
    }
}

/// A transition from one cluster state to the next.
#[derive(Debug, Clone)]
pub struct ClusterChangedEvent {
    previous: Arc<ClusterState>,
    current: Arc<ClusterState>,
}

impl ClusterChangedEvent {
    pub fn new(previous: Arc<ClusterState>, current: Arc<ClusterState>) -> Self {
        Self { previous, current }
    }

    #[must_use]
    pub fn previous(&self) -> &ClusterState {
        &self.previous
    }

    #[must_use]
    pub fn current(&self) -> &ClusterState {
        &self.current
    }

    /// True when the stored license differs between the two snapshots.
    #[must_use]
    pub fn license_changed(&self) -> bool {
        self.previous.license() != self.current.license()
    }
}

/// Receives cluster state transitions.
pub trait ClusterStateListener: Send + Sync {
    /// Handles one transition. An error means the listener could not apply
    /// the new state; the source still notifies the remaining listeners.
    fn cluster_changed(&self, event: &ClusterChangedEvent) -> LicenseResult<()>;
}

/// A source of cluster state transitions.
pub trait ClusterStateSource: Send + Sync {
    /// Subscribes `listener` to every future transition.
    fn add_listener(&self, listener: Arc<dyn ClusterStateListener>) -> ListenerId;

    /// Unsubscribes a listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);
}

/// In-process [`ClusterStateSource`] for embedding and tests.
///
/// [`Self::publish`] delivers to every listener in subscription order.
/// Publishes are serialized, so notifications never overlap. Listeners may
/// read [`Self::state`] but must not publish from inside a notification.
pub struct LocalClusterStateSource {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Arc<dyn ClusterStateListener>)>>,
    current: Mutex<Arc<ClusterState>>,
    publishing: Mutex<()>,
}

impl LocalClusterStateSource {
    pub fn new(initial: ClusterState) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
            current: Mutex::new(Arc::new(initial)),
            publishing: Mutex::new(()),
        }
    }

    /// Returns the most recently published state.
    #[must_use]
    pub fn state(&self) -> Arc<ClusterState> {
        let current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&current)
    }

    /// Installs `next` as the current state and notifies listeners.
    ///
    /// # Errors
    ///
    /// Every listener is notified even if one fails; the first failure is
    /// returned.
    pub fn publish(&self, next: ClusterState) -> LicenseResult<()> {
        let _publishing = self.publishing.lock().unwrap_or_else(|e| e.into_inner());
        let event = {
            let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
            let event = ClusterChangedEvent::new(Arc::clone(&current), Arc::new(next));
            *current = Arc::clone(&event.current);
            event
        };

        let listeners: Vec<_> = self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        debug!(listeners = listeners.len(), "publishing cluster state");

        let mut first_error = None;
        for listener in listeners {
            if let Err(e) = listener.cluster_changed(&event) {
                warn!(error = %e, "listener failed to apply cluster state");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl ClusterStateSource for LocalClusterStateSource {
    fn add_listener(&self, listener: Arc<dyn ClusterStateListener>) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|(existing, _)| *existing != id);
    }
}
