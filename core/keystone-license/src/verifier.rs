//! License verification, key creation and registration.
//!
//! Verification runs decode → decrypt → parse → expiry → signature and stops
//! at the first failure. Every failure on that path is an expected outcome
//! for untrusted input and is reported as `false` by [`LicenseVerifier::verify`].

use crate::error::{LicenseError, LicenseResult};
use crate::key::{DecodedLicense, LicenseKey, LicenseType};
use crate::metadata::LicenseMetadataWriter;
use crate::record::{LicenseRecord, now_millis};
use base64::{Engine, engine::general_purpose::STANDARD};
use keystone_crypto::{CryptoProvider, RsaPrivateKey, RsaPublicKey, public_key_from_der};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Public key of the licensing authority, X.509 SubjectPublicKeyInfo DER.
const BUNDLED_PUBLIC_KEY: &[u8] = include_bytes!("../resources/public.key");

/// Decides whether license envelopes are valid.
#[derive(Debug, Clone)]
pub struct LicenseVerifier {
    crypto: CryptoProvider,
    public_key: RsaPublicKey,
}

impl LicenseVerifier {
    /// Creates a verifier trusting `public_key` for enterprise signatures.
    pub fn new(crypto: CryptoProvider, public_key: RsaPublicKey) -> Self {
        Self { crypto, public_key }
    }

    /// Creates a verifier trusting the public key compiled into this crate.
    ///
    /// # Errors
    ///
    /// Fails only if the bundled resource is not a valid RSA public key.
    pub fn with_bundled_key(crypto: CryptoProvider) -> LicenseResult<Self> {
        let public_key =
            public_key_from_der(BUNDLED_PUBLIC_KEY).map_err(LicenseError::KeyMaterial)?;
        Ok(Self::new(crypto, public_key))
    }

    /// Creates a verifier trusting the public key stored at `path`.
    pub fn with_public_key_file(crypto: CryptoProvider, path: &Path) -> LicenseResult<Self> {
        let public_key =
            keystone_crypto::read_public_key(path).map_err(LicenseError::KeyMaterial)?;
        Ok(Self::new(crypto, public_key))
    }

    #[must_use]
    pub fn crypto(&self) -> &CryptoProvider {
        &self.crypto
    }

    /// Returns `true` if `key` is currently valid.
    #[must_use]
    pub fn verify(&self, key: &LicenseKey) -> bool {
        self.verify_at(key, now_millis())
    }

    /// Returns `true` if `key` is valid at `now_ms`.
    #[must_use]
    pub fn verify_at(&self, key: &LicenseKey, now_ms: i64) -> bool {
        match self.check(key, now_ms) {
            Ok(_) => true,
            Err(e) => {
                debug!(reason = %e, "license rejected");
                false
            }
        }
    }

    /// Runs the full verification pipeline, returning the accepted record or
    /// the reason for rejection.
    pub fn check(&self, key: &LicenseKey, now_ms: i64) -> LicenseResult<LicenseRecord> {
        let decoded = key.decode()?;
        let record = self.decrypt_license(&decoded)?;

        if record.is_expired(now_ms) {
            return Err(LicenseError::Expired(record.expiration_date_in_ms()));
        }

        match decoded.license_type() {
            LicenseType::Enterprise => {
                if self.verify_signature(&record)? {
                    Ok(record)
                } else {
                    Err(LicenseError::SignatureMismatch)
                }
            }
            LicenseType::SelfGenerated => Ok(record),
        }
    }

    /// Decodes and decrypts `key` without checking expiry or signature.
    pub fn license_data(&self, key: &LicenseKey) -> LicenseResult<LicenseRecord> {
        self.decrypt_license(&key.decode()?)
    }

    /// Decrypts and parses the payload of a decoded envelope.
    pub fn decrypt_license(&self, decoded: &DecodedLicense) -> LicenseResult<LicenseRecord> {
        let plaintext = self.crypto.decrypt_payload(decoded.encrypted_content())?;
        LicenseRecord::parse(&plaintext)
    }

    /// Checks the record's signature against the trusted public key.
    ///
    /// An absent or non-base64 signature is a mismatch, not an error.
    pub fn verify_signature(&self, record: &LicenseRecord) -> LicenseResult<bool> {
        let Some(signature) = record.signature() else {
            return Ok(false);
        };
        let Ok(signature) = STANDARD.decode(signature) else {
            return Ok(false);
        };
        let digest = self.crypto.digest(&record.signing_bytes()?);
        Ok(self.crypto.verify(&digest, &signature, &self.public_key))
    }

    /// Encrypts `record` and wraps it in an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::UnsupportedOperation`] for an enterprise
    /// record without a signature or a self-generated record with one.
    pub fn create_license_key(
        &self,
        license_type: LicenseType,
        version: i32,
        record: &LicenseRecord,
    ) -> LicenseResult<LicenseKey> {
        match (license_type, record.is_signed()) {
            (LicenseType::Enterprise, false) => {
                return Err(LicenseError::UnsupportedOperation(
                    "enterprise licenses must be signed".to_string(),
                ));
            }
            (LicenseType::SelfGenerated, true) => {
                return Err(LicenseError::UnsupportedOperation(
                    "self generated licenses cannot carry a signature".to_string(),
                ));
            }
            _ => {}
        }
        let encrypted = self.crypto.encrypt_payload(&record.format_for_storage()?);
        LicenseKey::encode(license_type, version, &encrypted)
    }

    /// Verifies `key` and, if valid, hands it to `writer` for cluster-wide
    /// persistence. A failed write is reported once and not retried.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidLicense`] without writing if the key
    /// does not verify, or the writer's error if the commit fails.
    pub async fn register_license(
        &self,
        key: LicenseKey,
        writer: &dyn LicenseMetadataWriter,
    ) -> LicenseResult<()> {
        if !self.verify(&key) {
            warn!("refusing to register invalid license key");
            return Err(LicenseError::InvalidLicense(
                "Unable to register the provided license key".to_string(),
            ));
        }
        writer.put_license(key).await?;
        info!("license registered in cluster metadata");
        Ok(())
    }

    /// Spawns [`Self::register_license`] on the current tokio runtime and
    /// passes its outcome to `on_result`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn register_license_with<F>(
        self: &Arc<Self>,
        key: LicenseKey,
        writer: Arc<dyn LicenseMetadataWriter>,
        on_result: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(LicenseResult<()>) + Send + 'static,
    {
        let verifier = Arc::clone(self);
        tokio::spawn(async move {
            let result = verifier.register_license(key, writer.as_ref()).await;
            on_result(result);
        })
    }
}

/// Signs an enterprise record: SHA512withRSA over the SHA-256 digest of its
/// unsigned canonical bytes. Any existing signature is replaced.
pub fn sign_license(
    crypto: &CryptoProvider,
    record: LicenseRecord,
    private_key: &RsaPrivateKey,
) -> LicenseResult<LicenseRecord> {
    let digest = crypto.digest(&record.signing_bytes()?);
    let signature = crypto
        .sign(&digest, private_key)
        .map_err(LicenseError::KeyMaterial)?;
    Ok(record.with_signature(STANDARD.encode(signature)))
}
