//! Error types for the crypto layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Asymmetric key generation failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Decryption failed (wrong key, bad padding or truncated input).
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Invalid symmetric key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Key material could not be imported or exported.
    #[error("invalid key encoding: {0}")]
    KeyEncoding(String),

    /// Reading or writing key files failed.
    #[error("key file i/o failed: {0}")]
    Io(#[from] std::io::Error),
}
