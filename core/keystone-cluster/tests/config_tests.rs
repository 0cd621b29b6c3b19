mod common;

use keystone_cluster::{ClusterError, ExpiryThresholds, LicensingConfig};
use keystone_crypto::{KeyPair, public_key_to_der};
use keystone_license::{LICENSE_VERSION, LicenseRecord, LicenseType};
use pretty_assertions::assert_eq;

#[test]
fn defaults() {
    let config = LicensingConfig::default();
    assert_eq!(config.passphrase, "crate_passphrase");
    assert!(config.public_key_path.is_none());
    assert_eq!(config.expiry.moderate_ms, 15 * common::DAY_MS);
    assert_eq!(config.expiry.severe_ms, common::DAY_MS);
    config.validate().unwrap();
}

#[test]
fn empty_json_is_default() {
    assert_eq!(LicensingConfig::from_json("{}").unwrap(), LicensingConfig::default());
}

#[test]
fn partial_json_keeps_other_defaults() {
    // Below the default severe window.
    let err = LicensingConfig::from_json(r#"{"expiry":{"moderate_ms":1000}}"#).unwrap_err();
    assert!(matches!(err, ClusterError::Config(_)));

    let config =
        LicensingConfig::from_json(r#"{"expiry":{"moderate_ms":172800000}}"#).unwrap();
    assert_eq!(
        config.expiry,
        ExpiryThresholds {
            moderate_ms: 172_800_000,
            severe_ms: common::DAY_MS,
        }
    );
    assert_eq!(config.passphrase, "crate_passphrase");
}

#[test]
fn json_roundtrip() {
    let config = LicensingConfig {
        passphrase: "0123456789abcdef".to_string(),
        public_key_path: Some("/etc/keystone/license.pub".into()),
        expiry: ExpiryThresholds {
            moderate_ms: 10,
            severe_ms: 5,
        },
    };
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(LicensingConfig::from_json(&json).unwrap(), config);
}

#[test]
fn short_passphrase_is_rejected() {
    let err = LicensingConfig::from_json(r#"{"passphrase":"short"}"#).unwrap_err();
    assert!(matches!(err, ClusterError::Config(_)));
}

#[test]
fn negative_threshold_is_rejected() {
    let config = LicensingConfig {
        expiry: ExpiryThresholds {
            moderate_ms: 10,
            severe_ms: -1,
        },
        ..LicensingConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn malformed_json_is_rejected() {
    assert!(matches!(
        LicensingConfig::from_json("{"),
        Err(ClusterError::Serialization(_))
    ));
}

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("licensing.json");
    std::fs::write(&path, r#"{"passphrase":"0123456789abcdef"}"#).unwrap();

    let config = LicensingConfig::load(&path).unwrap();
    assert_eq!(config.passphrase, "0123456789abcdef");
}

#[test]
fn load_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = LicensingConfig::load(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, ClusterError::Io(_)));
}

#[test]
fn default_verifier_accepts_default_keys() {
    let verifier = LicensingConfig::default().build_verifier().unwrap();
    let key = common::self_generated_key(&LicenseRecord::self_generated("crate"));
    assert!(verifier.verify(&key));
}

#[test]
fn passphrase_changes_payload_key() {
    let config = LicensingConfig {
        passphrase: "0123456789abcdef".to_string(),
        ..LicensingConfig::default()
    };
    let verifier = config.build_verifier().unwrap();
    let key = verifier
        .create_license_key(
            LicenseType::SelfGenerated,
            LICENSE_VERSION,
            &LicenseRecord::self_generated("crate"),
        )
        .unwrap();

    assert!(verifier.verify(&key));
    assert!(!common::verifier().verify(&key));
}

#[test]
fn public_key_path_overrides_bundled_key() {
    let pair = KeyPair::generate().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("authority.pub");
    std::fs::write(&path, public_key_to_der(pair.public_key()).unwrap()).unwrap();

    let config = LicensingConfig {
        public_key_path: Some(path),
        ..LicensingConfig::default()
    };
    let verifier = config.build_verifier().unwrap();
    let signed = keystone_license::sign_license(
        verifier.crypto(),
        LicenseRecord::new(i64::MAX, "acme"),
        pair.private_key(),
    )
    .unwrap();
    let key = verifier
        .create_license_key(LicenseType::Enterprise, LICENSE_VERSION, &signed)
        .unwrap();

    assert!(verifier.verify(&key));
    assert!(!common::verifier().verify(&key));
}

#[test]
fn missing_public_key_file_is_license_error() {
    let config = LicensingConfig {
        public_key_path: Some("/nonexistent/authority.pub".into()),
        ..LicensingConfig::default()
    };
    assert!(matches!(
        config.build_verifier(),
        Err(ClusterError::License(_))
    ));
}
