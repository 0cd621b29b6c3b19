//! Shared test helpers for cluster tests.

#![allow(dead_code)]

use async_trait::async_trait;
use keystone_cluster::{ClusterLicenseCoordinator, ClusterState, RegistrationWorker};
use keystone_crypto::CryptoProvider;
use keystone_license::{
    LICENSE_VERSION, LicenseError, LicenseKey, LicenseMetadataWriter, LicenseRecord,
    LicenseResult, LicenseType, LicenseVerifier,
};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

pub fn verifier() -> Arc<LicenseVerifier> {
    Arc::new(LicenseVerifier::with_bundled_key(CryptoProvider::default()).unwrap())
}

pub fn self_generated_key(record: &LicenseRecord) -> LicenseKey {
    verifier()
        .create_license_key(LicenseType::SelfGenerated, LICENSE_VERSION, record)
        .unwrap()
}

/// A state as seen by the elected leader.
pub fn leader_state(name: &str) -> ClusterState {
    ClusterState::new(name).with_leader(true)
}

/// Records committed keys and wakes waiters on every commit.
#[derive(Default)]
pub struct RecordingWriter {
    keys: Mutex<Vec<LicenseKey>>,
    committed: Notify,
    fail: bool,
}

impl RecordingWriter {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn committed(&self) -> Vec<LicenseKey> {
        self.keys.lock().unwrap().clone()
    }

    /// Waits until at least `count` keys were committed.
    pub async fn wait_for(&self, count: usize) {
        loop {
            let notified = self.committed.notified();
            if self.keys.lock().unwrap().len() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl LicenseMetadataWriter for RecordingWriter {
    async fn put_license(&self, key: LicenseKey) -> LicenseResult<()> {
        if self.fail {
            return Err(LicenseError::Registration("not the elected leader".to_string()));
        }
        self.keys.lock().unwrap().push(key);
        self.committed.notify_waiters();
        Ok(())
    }
}

pub fn coordinator() -> (Arc<ClusterLicenseCoordinator>, RegistrationWorker, Arc<RecordingWriter>) {
    let writer = Arc::new(RecordingWriter::default());
    let (coordinator, worker) = ClusterLicenseCoordinator::new(verifier(), writer.clone());
    (coordinator, worker, writer)
}
