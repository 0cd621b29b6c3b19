//! The license as a named custom object in replicated cluster metadata.
//!
//! The host packs custom objects back to back, both on the wire and in the
//! persisted JSON snapshot, so every reader here consumes exactly its own
//! object and reports how far it got.
//!
//! Persisted JSON:
//!
//! ```json
//! {"license":{"licenseKey":"AAAAAQAAAAAAAABA..."}}
//! ```

use crate::error::{LicenseError, LicenseResult};
use crate::key::LicenseKey;
use async_trait::async_trait;
use serde::Deserialize;
use std::io::{self, Read, Write};

/// Name under which the license is registered in cluster metadata.
pub const WRITEABLE_TYPE: &str = "license";

/// Upper bound on a stored envelope; anything larger is corrupt.
const MAX_ENVELOPE_LEN: usize = 64 * 1024;

/// The consensus-backed write path that persists a license cluster-wide.
///
/// Implementations apply their own retry and timeout policy.
#[async_trait]
pub trait LicenseMetadataWriter: Send + Sync {
    /// Commits `key` as the cluster's license.
    async fn put_license(&self, key: LicenseKey) -> LicenseResult<()>;
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PersistedLicense {
    license: PersistedLicenseBody,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PersistedLicenseBody {
    #[serde(rename = "licenseKey")]
    license_key: String,
}

impl LicenseKey {
    #[must_use]
    pub fn writeable_name(&self) -> &'static str {
        WRITEABLE_TYPE
    }

    /// Writes the length-prefixed envelope.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let bytes = self.as_bytes();
        let len = i32::try_from(bytes.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "license envelope too large")
        })?;
        out.write_all(&len.to_be_bytes())?;
        out.write_all(bytes)
    }

    /// Reads an envelope written by [`Self::write_to`].
    pub fn read_from<R: Read>(input: &mut R) -> LicenseResult<Self> {
        let mut len = [0u8; 4];
        input.read_exact(&mut len)?;
        let len = i32::from_be_bytes(len);
        let len = usize::try_from(len)
            .ok()
            .filter(|len| *len <= MAX_ENVELOPE_LEN)
            .ok_or_else(|| {
                LicenseError::MetadataParsing(format!("invalid envelope length {len}"))
            })?;
        let mut envelope = vec![0u8; len];
        input.read_exact(&mut envelope)?;
        Ok(Self::from_bytes(envelope))
    }

    /// Returns the persisted JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "license": { "licenseKey": self.to_text() }
        })
    }

    /// Parses one persisted license object from the front of `input`.
    ///
    /// Returns the key and the number of bytes consumed, so the caller can
    /// continue with the next packed object.
    pub fn from_json_stream(input: &[u8]) -> LicenseResult<(Self, usize)> {
        let mut stream =
            serde_json::Deserializer::from_slice(input).into_iter::<PersistedLicense>();
        let persisted = match stream.next() {
            Some(Ok(persisted)) => persisted,
            Some(Err(e)) => return Err(LicenseError::MetadataParsing(e.to_string())),
            None => {
                return Err(LicenseError::MetadataParsing(
                    "expected a license object".to_string(),
                ));
            }
        };
        let consumed = stream.byte_offset();
        let key = Self::from_text(&persisted.license.license_key)
            .map_err(|e| LicenseError::MetadataParsing(e.to_string()))?;
        Ok((key, consumed))
    }

    /// Computes the metadata diff from `previous` to `self`.
    #[must_use]
    pub fn diff(&self, previous: Option<&LicenseKey>) -> LicenseKeyDiff {
        if previous == Some(self) {
            LicenseKeyDiff::Same
        } else {
            LicenseKeyDiff::Complete(self.clone())
        }
    }
}

/// A metadata diff for the license custom object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseKeyDiff {
    /// The license did not change.
    Same,
    /// The license was replaced wholesale.
    Complete(LicenseKey),
}

impl LicenseKeyDiff {
    /// Applies the diff on top of `previous`.
    #[must_use]
    pub fn apply(self, previous: Option<LicenseKey>) -> Option<LicenseKey> {
        match self {
            Self::Same => previous,
            Self::Complete(key) => Some(key),
        }
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self {
            Self::Same => out.write_all(&[0]),
            Self::Complete(key) => {
                out.write_all(&[1])?;
                key.write_to(out)
            }
        }
    }

    pub fn read_from<R: Read>(input: &mut R) -> LicenseResult<Self> {
        let mut tag = [0u8; 1];
        input.read_exact(&mut tag)?;
        match tag[0] {
            0 => Ok(Self::Same),
            1 => Ok(Self::Complete(LicenseKey::read_from(input)?)),
            other => Err(LicenseError::MetadataParsing(format!(
                "unknown diff tag {other}"
            ))),
        }
    }
}
