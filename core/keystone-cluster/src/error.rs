//! Error types for the cluster layer.

use keystone_license::LicenseError;
use thiserror::Error;

/// Result type for cluster operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Errors raised while wiring licensing into a cluster node.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Invalid configuration value.
    #[error("invalid licensing configuration: {0}")]
    Config(String),

    /// License layer error.
    #[error(transparent)]
    License(#[from] LicenseError),

    /// Reading configuration failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is not valid JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
