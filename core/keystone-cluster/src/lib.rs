//! Cluster-wide license propagation for Keystone nodes.
//!
//! This crate handles:
//! - Tracking the license stored in replicated cluster metadata
//! - Bootstrapping a self-generated license on a fresh cluster (leader only)
//! - Serving the current license to readers without locking
//! - Reporting upcoming expiry as a node health check
//!
//! The host supplies cluster state transitions through
//! [`ClusterStateSource`] and the consensus write path through
//! [`keystone_license::LicenseMetadataWriter`].
//!
//! ```ignore
//! let verifier = Arc::new(LicensingConfig::default().build_verifier()?);
//! let (coordinator, worker) = ClusterLicenseCoordinator::new(verifier, writer);
//! tokio::spawn(worker.run());
//! coordinator.start(&source);
//!
//! let check = LicenseExpiryCheck::new(coordinator.clone(), ExpiryThresholds::default());
//! ```

mod config;
mod coordinator;
mod error;
mod expiry;
mod state;

pub use config::{ExpiryThresholds, LicensingConfig};
pub use coordinator::{ClusterLicenseCoordinator, LicenseAction, RegistrationWorker};
pub use error::{ClusterError, ClusterResult};
pub use expiry::{
    CurrentLicense, HealthCheck, LICENSE_EXPIRY_CHECK_ID, LicenseExpiryCheck,
    LicenseExpiryNotification, Severity,
};
pub use state::{
    ClusterChangedEvent, ClusterState, ClusterStateListener, ClusterStateSource, ListenerId,
    LocalClusterStateSource,
};
