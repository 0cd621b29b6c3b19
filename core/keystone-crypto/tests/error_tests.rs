use keystone_crypto::CryptoError;

#[test]
fn error_display_key_generation() {
    let err = CryptoError::KeyGeneration("rng failure".into());
    assert!(format!("{err}").contains("key generation failed"));
    assert!(format!("{err}").contains("rng failure"));
}

#[test]
fn error_display_decryption() {
    let err = CryptoError::Decryption("bad padding".into());
    assert!(format!("{err}").contains("decryption failed"));
}

#[test]
fn error_display_signing() {
    let err = CryptoError::Signing("message too long".into());
    assert!(format!("{err}").contains("signing failed"));
}

#[test]
fn error_display_invalid_key_length() {
    let err = CryptoError::InvalidKeyLength {
        expected: 16,
        actual: 5,
    };
    let msg = format!("{err}");
    assert!(msg.contains("16"));
    assert!(msg.contains("5"));
}

#[test]
fn error_display_key_encoding() {
    let err = CryptoError::KeyEncoding("unexpected tag".into());
    assert!(format!("{err}").contains("invalid key encoding"));
}

#[test]
fn error_from_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "public.key");
    let crypto_err: CryptoError = io_err.into();
    assert!(format!("{crypto_err}").contains("i/o"));
}

#[test]
fn error_is_debug() {
    let err = CryptoError::Signing("test".into());
    let _ = format!("{err:?}");
}
