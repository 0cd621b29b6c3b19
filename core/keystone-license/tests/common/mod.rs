//! Shared test helpers for license tests.

#![allow(dead_code)]

use async_trait::async_trait;
use keystone_crypto::{CryptoProvider, RsaPrivateKey, private_key_from_der};
use keystone_license::{
    LICENSE_VERSION, LicenseError, LicenseKey, LicenseMetadataWriter, LicenseRecord,
    LicenseResult, LicenseType, LicenseVerifier, now_millis, sign_license,
};
use std::sync::Mutex;

/// PKCS#8 private half of the bundled public key.
pub const PRIVATE_KEY: &[u8] = include_bytes!("../resources/private.key");

pub const HOUR_MS: i64 = 60 * 60 * 1000;

pub fn private_key() -> RsaPrivateKey {
    private_key_from_der(PRIVATE_KEY).unwrap()
}

/// A verifier trusting the bundled public key, keyed with the default passphrase.
pub fn verifier() -> LicenseVerifier {
    LicenseVerifier::with_bundled_key(CryptoProvider::default()).unwrap()
}

/// Signs `record` with the test authority key.
pub fn sign(record: LicenseRecord) -> LicenseRecord {
    sign_license(&CryptoProvider::default(), record, &private_key()).unwrap()
}

pub fn self_generated_key(record: &LicenseRecord) -> LicenseKey {
    verifier()
        .create_license_key(LicenseType::SelfGenerated, LICENSE_VERSION, record)
        .unwrap()
}

/// Signs `record` and wraps it as an enterprise key.
pub fn enterprise_key(record: LicenseRecord) -> LicenseKey {
    verifier()
        .create_license_key(LicenseType::Enterprise, LICENSE_VERSION, &sign(record))
        .unwrap()
}

pub fn hours_ago(hours: i64) -> i64 {
    now_millis() - hours * HOUR_MS
}

/// Records every committed key; optionally fails every commit.
#[derive(Default)]
pub struct RecordingWriter {
    pub keys: Mutex<Vec<LicenseKey>>,
    pub fail: bool,
}

impl RecordingWriter {
    pub fn failing() -> Self {
        Self {
            keys: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn committed(&self) -> Vec<LicenseKey> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl LicenseMetadataWriter for RecordingWriter {
    async fn put_license(&self, key: LicenseKey) -> LicenseResult<()> {
        if self.fail {
            return Err(LicenseError::Registration("not the elected leader".to_string()));
        }
        self.keys.lock().unwrap().push(key);
        Ok(())
    }
}
