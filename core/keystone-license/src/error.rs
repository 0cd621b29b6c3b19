//! Error types for the licensing module.
//!
//! Untrusted-input failures (`MalformedKey` through `Expired`) never escape
//! [`crate::LicenseVerifier::verify`]; they collapse into an invalid verdict.
//! The remaining variants describe defects in the caller or the cluster.

use keystone_crypto::CryptoError;
use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// The envelope could not be decoded.
    #[error("malformed license key: {0}")]
    MalformedKey(String),

    /// The payload could not be decrypted.
    #[error("unable to decrypt license: {0}")]
    Decryption(#[from] CryptoError),

    /// The decrypted payload is missing required fields or is not JSON.
    #[error("invalid license payload: {0}")]
    Parse(String),

    /// Loading or using RSA key material failed.
    #[error("key material error: {0}")]
    KeyMaterial(#[source] CryptoError),

    /// The enterprise signature does not match the payload.
    #[error("license signature invalid")]
    SignatureMismatch,

    /// The license expired at the given epoch millisecond.
    #[error("license expired at {0}ms")]
    Expired(i64),

    /// A license type code outside the known range.
    #[error("Invalid License Type: {0}")]
    InvalidLicenseType(i32),

    /// An operation was attempted on a license type it does not support.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A license was rejected before any cluster write was attempted.
    #[error("invalid license: {0}")]
    InvalidLicense(String),

    /// A license already accepted into cluster metadata no longer decodes.
    #[error("invalid license present in cluster: {0}")]
    ClusterLicenseCorruption(String),

    /// The persisted metadata object could not be read.
    #[error("unable to parse license metadata: {0}")]
    MetadataParsing(String),

    /// The cluster metadata write failed.
    #[error("license registration failed: {0}")]
    Registration(String),

    /// Reading resources failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
