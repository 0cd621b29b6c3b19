//! The decrypted license payload.
//!
//! Stored form is compact JSON with a fixed field order:
//!
//! ```json
//! {"expirationDateInMs":9223372036854775807,"issuedTo":"cluster-a","signature":"..."}
//! ```
//!
//! `signature` is present only on signed (enterprise) records. Signatures are
//! always computed over the form without it, see [`LicenseRecord::signing_bytes`].

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current wall-clock time in epoch milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// A license payload. Immutable; signing produces a new record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseRecord {
    #[serde(rename = "expirationDateInMs")]
    expiration_date_in_ms: i64,
    #[serde(rename = "issuedTo")]
    issued_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
}

#[derive(Serialize)]
struct CanonicalForm<'a> {
    #[serde(rename = "expirationDateInMs")]
    expiration_date_in_ms: i64,
    #[serde(rename = "issuedTo")]
    issued_to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<&'a str>,
}

impl LicenseRecord {
    /// Creates an unsigned record.
    pub fn new(expiration_date_in_ms: i64, issued_to: impl Into<String>) -> Self {
        Self {
            expiration_date_in_ms,
            issued_to: issued_to.into(),
            signature: None,
        }
    }

    /// Creates the never-expiring record a fresh cluster issues to itself.
    pub fn self_generated(cluster_name: impl Into<String>) -> Self {
        Self::new(i64::MAX, cluster_name)
    }

    /// Attaches a base64 signature, replacing any previous one.
    #[must_use]
    pub fn with_signature(self, signature: impl Into<String>) -> Self {
        Self {
            signature: Some(signature.into()),
            ..self
        }
    }

    #[must_use]
    pub fn expiration_date_in_ms(&self) -> i64 {
        self.expiration_date_in_ms
    }

    #[must_use]
    pub fn issued_to(&self) -> &str {
        &self.issued_to
    }

    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Returns the expiration as a timestamp, or `None` if it is outside
    /// chrono's range (e.g. the self-generated `i64::MAX`).
    #[must_use]
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expiration_date_in_ms)
    }

    /// True when the expiration lies strictly before `now_ms`.
    #[must_use]
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expiration_date_in_ms < now_ms
    }

    /// Milliseconds left until expiry at `now_ms`; negative once expired.
    #[must_use]
    pub fn millis_until_expiry(&self, now_ms: i64) -> i64 {
        self.expiration_date_in_ms.saturating_sub(now_ms)
    }

    /// Serializes `{expirationDateInMs, issuedTo[, signature]}`.
    ///
    /// With `include_signature` set, an unsigned record emits an empty
    /// signature string.
    pub fn canonical_bytes(&self, include_signature: bool) -> LicenseResult<Vec<u8>> {
        let form = CanonicalForm {
            expiration_date_in_ms: self.expiration_date_in_ms,
            issued_to: &self.issued_to,
            signature: include_signature.then(|| self.signature.as_deref().unwrap_or_default()),
        };
        Ok(serde_json::to_vec(&form)?)
    }

    /// The stored form: includes the signature only if one is set.
    pub fn format_for_storage(&self) -> LicenseResult<Vec<u8>> {
        self.canonical_bytes(self.is_signed())
    }

    /// The exact bytes a signature covers (before digesting).
    pub fn signing_bytes(&self) -> LicenseResult<Vec<u8>> {
        self.canonical_bytes(false)
    }

    /// Parses a stored payload.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Parse`] if the bytes are not a JSON object
    /// with an integer `expirationDateInMs` and a string `issuedTo`.
    pub fn parse(bytes: &[u8]) -> LicenseResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| LicenseError::Parse(e.to_string()))
    }
}

impl PartialEq for LicenseRecord {
    fn eq(&self, other: &Self) -> bool {
        self.expiration_date_in_ms == other.expiration_date_in_ms
            && self.issued_to == other.issued_to
            && self.signature.as_deref().unwrap_or_default()
                == other.signature.as_deref().unwrap_or_default()
    }
}

impl Eq for LicenseRecord {}
