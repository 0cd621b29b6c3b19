//! The license envelope and its codec.
//!
//! An envelope is `version:i32 | type:i32 | len:i32 | ciphertext[len]`,
//! all integers big-endian. Its text form is standard padded base64 of
//! those bytes. A `LicenseKey` keeps the raw envelope bytes so two keys are
//! equal exactly when their stored form is equal; structure is only checked
//! by [`LicenseKey::decode`].

use crate::error::{LicenseError, LicenseResult};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// Envelope version written by this node and the only one it decodes.
pub const LICENSE_VERSION: i32 = 1;

const HEADER_LEN: usize = 12;

/// The kind of license an envelope carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseType {
    /// Synthesized by the cluster itself; trusted without a signature.
    SelfGenerated,
    /// Issued by the licensing authority; must carry a valid signature.
    Enterprise,
}

impl LicenseType {
    /// Returns the stable wire code.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::SelfGenerated => 0,
            Self::Enterprise => 1,
        }
    }

    /// Looks up a type by wire code.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidLicenseType`] for unknown codes.
    pub fn of(code: i32) -> LicenseResult<Self> {
        match code {
            0 => Ok(Self::SelfGenerated),
            1 => Ok(Self::Enterprise),
            other => Err(LicenseError::InvalidLicenseType(other)),
        }
    }
}

impl TryFrom<i32> for LicenseType {
    type Error = LicenseError;

    fn try_from(code: i32) -> LicenseResult<Self> {
        Self::of(code)
    }
}

/// An encoded license envelope, as stored in cluster metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LicenseKey {
    envelope: Vec<u8>,
}

impl LicenseKey {
    /// Builds an envelope. The ciphertext is not inspected.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::MalformedKey`] if the ciphertext is too long
    /// for the envelope's 32-bit length field.
    pub fn encode(
        license_type: LicenseType,
        version: i32,
        encrypted_content: &[u8],
    ) -> LicenseResult<Self> {
        let len = i32::try_from(encrypted_content.len()).map_err(|_| {
            LicenseError::MalformedKey(format!(
                "content length {} exceeds the envelope limit",
                encrypted_content.len()
            ))
        })?;
        let mut envelope = Vec::with_capacity(HEADER_LEN + encrypted_content.len());
        envelope.extend_from_slice(&version.to_be_bytes());
        envelope.extend_from_slice(&license_type.code().to_be_bytes());
        envelope.extend_from_slice(&len.to_be_bytes());
        envelope.extend_from_slice(encrypted_content);
        Ok(Self { envelope })
    }

    /// Wraps raw envelope bytes read from storage.
    #[must_use]
    pub fn from_bytes(envelope: Vec<u8>) -> Self {
        Self { envelope }
    }

    /// Parses the base64 text form.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::MalformedKey`] if `text` is not valid base64.
    pub fn from_text(text: &str) -> LicenseResult<Self> {
        let envelope = STANDARD
            .decode(text.trim())
            .map_err(|e| LicenseError::MalformedKey(format!("invalid base64: {e}")))?;
        Ok(Self { envelope })
    }

    /// Returns the base64 text form.
    #[must_use]
    pub fn to_text(&self) -> String {
        STANDARD.encode(&self.envelope)
    }

    /// Returns the raw envelope bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.envelope
    }

    /// Splits the envelope into its fields.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::MalformedKey`] if the version is not
    /// [`LICENSE_VERSION`], the type code is unknown, or the layout is
    /// truncated or has trailing bytes.
    pub fn decode(&self) -> LicenseResult<DecodedLicense> {
        let mut reader = EnvelopeReader::new(&self.envelope);
        let version = reader.read_i32()?;
        if version != LICENSE_VERSION {
            return Err(LicenseError::MalformedKey(format!(
                "unsupported license version {version}"
            )));
        }
        let type_code = reader.read_i32()?;
        let license_type = LicenseType::of(type_code)
            .map_err(|_| LicenseError::MalformedKey(format!("unknown license type {type_code}")))?;
        let len = reader.read_i32()?;
        let len = usize::try_from(len)
            .map_err(|_| LicenseError::MalformedKey(format!("negative content length {len}")))?;
        let encrypted_content = reader.read_bytes(len)?.to_vec();
        reader.finish()?;

        Ok(DecodedLicense {
            license_type,
            version,
            encrypted_content,
        })
    }
}

impl std::fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl std::str::FromStr for LicenseKey {
    type Err = LicenseError;

    fn from_str(s: &str) -> LicenseResult<Self> {
        Self::from_text(s)
    }
}

/// The fields of an envelope, produced by [`LicenseKey::decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLicense {
    license_type: LicenseType,
    version: i32,
    encrypted_content: Vec<u8>,
}

impl DecodedLicense {
    #[must_use]
    pub fn license_type(&self) -> LicenseType {
        self.license_type
    }

    #[must_use]
    pub fn version(&self) -> i32 {
        self.version
    }

    #[must_use]
    pub fn encrypted_content(&self) -> &[u8] {
        &self.encrypted_content
    }
}

struct EnvelopeReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> EnvelopeReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn read_bytes(&mut self, len: usize) -> LicenseResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                LicenseError::MalformedKey(format!(
                    "truncated envelope: need {len} bytes at offset {}, have {}",
                    self.pos,
                    self.buf.len() - self.pos
                ))
            })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_i32(&mut self) -> LicenseResult<i32> {
        let bytes = self.read_bytes(4)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn finish(&self) -> LicenseResult<()> {
        if self.pos == self.buf.len() {
            Ok(())
        } else {
            Err(LicenseError::MalformedKey(format!(
                "{} trailing bytes after envelope",
                self.buf.len() - self.pos
            )))
        }
    }
}
