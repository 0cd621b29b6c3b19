//! Licensing configuration.
//!
//! ```json
//! {
//!   "passphrase": "crate_passphrase",
//!   "public_key_path": "/etc/keystone/license.pub",
//!   "expiry": { "moderate_ms": 1296000000, "severe_ms": 86400000 }
//! }
//! ```
//!
//! Every field is optional.

use crate::error::{ClusterError, ClusterResult};
use keystone_crypto::{CryptoProvider, DEFAULT_PASSPHRASE, KEY_SIZE};
use keystone_license::LicenseVerifier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Warning windows for [`crate::LicenseExpiryCheck`], in milliseconds
/// before expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpiryThresholds {
    pub moderate_ms: i64,
    pub severe_ms: i64,
}

impl Default for ExpiryThresholds {
    fn default() -> Self {
        Self {
            moderate_ms: 15 * DAY_MS,
            severe_ms: DAY_MS,
        }
    }
}

/// Node licensing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicensingConfig {
    /// Symmetric passphrase for license payloads. Must be exactly
    /// [`KEY_SIZE`] bytes.
    pub passphrase: String,
    /// Public key overriding the bundled licensing authority key.
    pub public_key_path: Option<PathBuf>,
    pub expiry: ExpiryThresholds,
}

impl Default for LicensingConfig {
    fn default() -> Self {
        Self {
            passphrase: DEFAULT_PASSPHRASE.to_string(),
            public_key_path: None,
            expiry: ExpiryThresholds::default(),
        }
    }
}

impl LicensingConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> ClusterResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    pub fn load(path: &Path) -> ClusterResult<Self> {
        debug!(path = %path.display(), "loading licensing configuration");
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> ClusterResult<()> {
        if self.passphrase.len() != KEY_SIZE {
            return Err(ClusterError::Config(format!(
                "passphrase must be {KEY_SIZE} bytes, got {}",
                self.passphrase.len()
            )));
        }
        let ExpiryThresholds {
            moderate_ms,
            severe_ms,
        } = self.expiry;
        if severe_ms < 0 || moderate_ms < severe_ms {
            return Err(ClusterError::Config(format!(
                "expiry thresholds must satisfy 0 <= severe ({severe_ms}) <= moderate ({moderate_ms})"
            )));
        }
        Ok(())
    }

    /// Builds the crypto provider keyed by the configured passphrase.
    pub fn crypto_provider(&self) -> ClusterResult<CryptoProvider> {
        CryptoProvider::from_passphrase(&self.passphrase)
            .map_err(|e| ClusterError::Config(e.to_string()))
    }

    /// Builds a verifier from this configuration.
    pub fn build_verifier(&self) -> ClusterResult<LicenseVerifier> {
        self.validate()?;
        let crypto = self.crypto_provider()?;
        let verifier = match &self.public_key_path {
            Some(path) => LicenseVerifier::with_public_key_file(crypto, path)?,
            None => LicenseVerifier::with_bundled_key(crypto)?,
        };
        Ok(verifier)
    }
}
