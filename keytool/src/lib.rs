//! Issuing authority operations for Keystone license keys.
//!
//! Runs out of band: the private key is only ever loaded here, never by a
//! cluster node.

use anyhow::{Context, Result, bail};
use keystone_crypto::{CryptoProvider, KeyPair, SymmetricKey, read_private_key};
use keystone_license::{
    LICENSE_VERSION, LicenseKey, LicenseRecord, LicenseType, LicenseVerifier, sign_license,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// What `inspect` reports about a license key.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KeyInspection {
    pub license_type: LicenseType,
    pub version: i32,
    pub issued_to: String,
    pub expiration_date_in_ms: i64,
    pub expires_at: Option<String>,
    pub signed: bool,
    pub valid: bool,
    pub reason: Option<String>,
}

/// Builds the payload cipher, keyed by `passphrase` or the shipped default.
pub fn crypto_provider(passphrase: Option<&str>) -> Result<CryptoProvider> {
    match passphrase {
        Some(passphrase) => {
            let key = SymmetricKey::from_passphrase(passphrase).context("Invalid passphrase")?;
            Ok(CryptoProvider::new(key))
        }
        None => Ok(CryptoProvider::default()),
    }
}

/// Epoch millisecond `days` after `now_ms`.
pub fn expiration_in_days(now_ms: i64, days: u32) -> Result<i64> {
    i64::from(days)
        .checked_mul(DAY_MS)
        .and_then(|offset| now_ms.checked_add(offset))
        .context("Expiration out of range")
}

/// Writes a fresh RSA key pair as DER files.
pub fn generate_keys(
    crypto: &CryptoProvider,
    public_path: &Path,
    private_path: &Path,
) -> Result<()> {
    info!("Generating RSA key pair");
    let pair = crypto
        .generate_key_pair()
        .context("Failed to generate key pair")?;
    pair.write_to_files(public_path, private_path)
        .context("Failed to write key files")?;
    info!("Wrote public key to {:?}", public_path);
    info!("Wrote private key to {:?}", private_path);
    Ok(())
}

/// Signs and encodes an enterprise license with the authority key at
/// `private_path`.
pub fn issue(
    crypto: &CryptoProvider,
    private_path: &Path,
    issued_to: &str,
    expiration_date_in_ms: i64,
    now_ms: i64,
) -> Result<LicenseKey> {
    let private_key = read_private_key(private_path)
        .with_context(|| format!("Failed to read private key {private_path:?}"))?;
    let pair = KeyPair::from_private_key(private_key);

    let record = sign_license(
        crypto,
        LicenseRecord::new(expiration_date_in_ms, issued_to),
        pair.private_key(),
    )
    .context("Failed to sign license")?;
    let verifier = LicenseVerifier::new(crypto.clone(), pair.public_key().clone());
    let key = verifier
        .create_license_key(LicenseType::Enterprise, LICENSE_VERSION, &record)
        .context("Failed to encode license")?;

    if let Err(e) = verifier.check(&key, now_ms) {
        bail!("Issued license does not verify: {e}");
    }
    debug!(issued_to, expiration_date_in_ms, "issued enterprise license");
    Ok(key)
}

/// Encodes a never-expiring self-generated license.
pub fn self_generated(crypto: &CryptoProvider, issued_to: &str) -> Result<LicenseKey> {
    let verifier = LicenseVerifier::with_bundled_key(crypto.clone())?;
    let key = verifier.create_license_key(
        LicenseType::SelfGenerated,
        LICENSE_VERSION,
        &LicenseRecord::self_generated(issued_to),
    )?;
    Ok(key)
}

/// Decodes `text` and reports its contents and validity at `now_ms`.
///
/// Fails only if the key cannot be decoded or decrypted; an expired or
/// badly signed key is reported with `valid: false`.
pub fn inspect(verifier: &LicenseVerifier, text: &str, now_ms: i64) -> Result<KeyInspection> {
    let key = LicenseKey::from_text(text).context("License key is not valid base64")?;
    let decoded = key.decode().context("Malformed license key")?;
    let record = verifier
        .decrypt_license(&decoded)
        .context("Unable to decrypt license")?;

    let verdict = verifier.check(&key, now_ms);
    Ok(KeyInspection {
        license_type: decoded.license_type(),
        version: decoded.version(),
        issued_to: record.issued_to().to_string(),
        expiration_date_in_ms: record.expiration_date_in_ms(),
        expires_at: record.expiration().map(|at| at.to_rfc3339()),
        signed: record.is_signed(),
        valid: verdict.is_ok(),
        reason: verdict.err().map(|e| e.to_string()),
    })
}
