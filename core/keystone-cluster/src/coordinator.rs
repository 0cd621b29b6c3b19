//! Cluster license coordinator.
//!
//! Owns the node's current-license cache and keeps it in step with the
//! license stored in replicated cluster metadata.
//!
//! Each notification is handled in two steps:
//! - [`ClusterLicenseCoordinator::plan`] is a pure function of the event and
//!   decides a [`LicenseAction`].
//! - [`ClusterLicenseCoordinator::apply`] publishes the new record and queues
//!   any bootstrap key for the [`RegistrationWorker`], which performs the
//!   asynchronous cluster write.
//!
//! The cache is an [`ArcSwapOption`]: readers load a snapshot without locking
//! and the single writer swaps a whole record in, so a reader never sees a
//! half-updated record.

use crate::state::{ClusterChangedEvent, ClusterStateListener, ClusterStateSource, ListenerId};
use arc_swap::ArcSwapOption;
use keystone_license::{
    LICENSE_VERSION, LicenseError, LicenseKey, LicenseMetadataWriter, LicenseRecord,
    LicenseResult, LicenseType, LicenseVerifier,
};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Bootstrap keys waiting for the registration worker.
const REGISTRATION_QUEUE: usize = 16;

/// What a cluster state transition requires of this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseAction {
    /// Nothing changed, or this node is not responsible.
    None,
    /// Fresh cluster and this node leads: cache `record` and persist `key`.
    Bootstrap {
        key: LicenseKey,
        record: LicenseRecord,
    },
    /// A new license landed in metadata; replace the cache.
    Replace(LicenseRecord),
}

/// Keeps the current license cache consistent with cluster metadata.
pub struct ClusterLicenseCoordinator {
    verifier: Arc<LicenseVerifier>,
    current: ArcSwapOption<LicenseRecord>,
    registrations: Mutex<Option<mpsc::Sender<LicenseKey>>>,
    listener: Mutex<Option<ListenerId>>,
}

impl ClusterLicenseCoordinator {
    /// Creates a coordinator and the worker that persists its bootstrap
    /// licenses through `writer`.
    ///
    /// The caller drives the worker, typically with
    /// `tokio::spawn(worker.run())`.
    pub fn new(
        verifier: Arc<LicenseVerifier>,
        writer: Arc<dyn LicenseMetadataWriter>,
    ) -> (Arc<Self>, RegistrationWorker) {
        let (tx, rx) = mpsc::channel(REGISTRATION_QUEUE);
        let coordinator = Arc::new(Self {
            verifier: Arc::clone(&verifier),
            current: ArcSwapOption::empty(),
            registrations: Mutex::new(Some(tx)),
            listener: Mutex::new(None),
        });
        let worker = RegistrationWorker {
            verifier,
            writer,
            queue: rx,
        };
        (coordinator, worker)
    }

    #[must_use]
    pub fn verifier(&self) -> &Arc<LicenseVerifier> {
        &self.verifier
    }

    /// Returns the cached license. Never blocks.
    #[must_use]
    pub fn current_license(&self) -> Option<Arc<LicenseRecord>> {
        self.current.load_full()
    }

    /// Subscribes to `source`. Calling it again replaces the subscription.
    pub fn start(self: &Arc<Self>, source: &dyn ClusterStateSource) {
        let id = source.add_listener(Arc::clone(self) as Arc<dyn ClusterStateListener>);
        let previous = self
            .listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(id);
        if let Some(previous) = previous {
            source.remove_listener(previous);
        }
        debug!(listener = id, "license coordinator started");
    }

    /// Unsubscribes from `source`, clears the cache and stops the
    /// registration worker once its queue drains.
    pub fn close(&self, source: &dyn ClusterStateSource) {
        if let Some(id) = self
            .listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            source.remove_listener(id);
        }
        self.registrations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        self.current.store(None);
        debug!("license coordinator closed");
    }

    /// Decides how to react to `event` without touching any state.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::ClusterLicenseCorruption`] when the license
    /// newly stored in metadata cannot be decoded or decrypted, and
    /// propagates failures building the bootstrap key.
    pub fn plan(&self, event: &ClusterChangedEvent) -> LicenseResult<LicenseAction> {
        let current = event.current();
        if !current.state_recovered() {
            return Ok(LicenseAction::None);
        }

        if event.license_changed() {
            let Some(stored) = current.license() else {
                return Ok(LicenseAction::None);
            };
            let record = self
                .verifier
                .license_data(stored)
                .map_err(|e| LicenseError::ClusterLicenseCorruption(e.to_string()))?;
            return Ok(LicenseAction::Replace(record));
        }

        if current.license().is_some() || !current.local_node_is_leader() {
            return Ok(LicenseAction::None);
        }
        let record = LicenseRecord::self_generated(current.cluster_name());
        let key = self.verifier.create_license_key(
            LicenseType::SelfGenerated,
            LICENSE_VERSION,
            &record,
        )?;
        Ok(LicenseAction::Bootstrap { key, record })
    }

    /// Carries out an action decided by [`Self::plan`].
    pub fn apply(&self, action: LicenseAction) {
        match action {
            LicenseAction::None => {}
            LicenseAction::Bootstrap { key, record } => {
                info!(issued_to = record.issued_to(), "bootstrapping self generated license");
                self.current.store(Some(Arc::new(record)));
                self.queue_registration(key);
            }
            LicenseAction::Replace(record) => {
                debug!(
                    issued_to = record.issued_to(),
                    expiration = record.expiration_date_in_ms(),
                    "license updated from cluster state"
                );
                self.current.store(Some(Arc::new(record)));
            }
        }
    }

    /// Plans and applies `event`. Corruption is logged and returned; the
    /// cache keeps its previous value.
    pub fn handle(&self, event: &ClusterChangedEvent) -> LicenseResult<()> {
        match self.plan(event) {
            Ok(action) => {
                self.apply(action);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "unable to process license from cluster state");
                Err(e)
            }
        }
    }

    fn queue_registration(&self, key: LicenseKey) {
        let guard = self.registrations.lock().unwrap_or_else(|e| e.into_inner());
        let Some(tx) = guard.as_ref() else {
            warn!("coordinator closed, dropping bootstrap license");
            return;
        };
        // A dropped bootstrap is retried by the next notification that still
        // sees an empty cluster.
        if let Err(e) = tx.try_send(key) {
            warn!(error = %e, "unable to queue bootstrap license registration");
        }
    }
}

impl ClusterStateListener for ClusterLicenseCoordinator {
    fn cluster_changed(&self, event: &ClusterChangedEvent) -> LicenseResult<()> {
        self.handle(event)
    }
}

/// Persists bootstrap licenses queued by the coordinator.
pub struct RegistrationWorker {
    verifier: Arc<LicenseVerifier>,
    writer: Arc<dyn LicenseMetadataWriter>,
    queue: mpsc::Receiver<LicenseKey>,
}

impl RegistrationWorker {
    /// Registers queued keys one at a time until the coordinator closes.
    ///
    /// A failed write is logged once and not retried.
    pub async fn run(mut self) {
        while let Some(key) = self.queue.recv().await {
            match self
                .verifier
                .register_license(key, self.writer.as_ref())
                .await
            {
                Ok(()) => info!("bootstrap license registered"),
                Err(e) => error!(error = %e, "unable to register bootstrap license"),
            }
        }
        debug!("registration worker stopped");
    }
}
