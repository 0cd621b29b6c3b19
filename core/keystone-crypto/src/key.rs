//! Key material: the symmetric payload key and RSA key pairs.
//!
//! Public keys are exchanged as X.509 SubjectPublicKeyInfo DER, private keys
//! as PKCS#8 DER. The running cluster only ever loads public keys; private
//! keys belong to the issuing authority.

use crate::error::{CryptoError, CryptoResult};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fs;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the symmetric key in bytes (AES-128).
pub const KEY_SIZE: usize = 16;

/// Modulus size of generated RSA keys.
pub const RSA_KEY_BITS: usize = 2048;

/// Passphrase every node ships with. Envelopes written by existing clusters
/// are encrypted under it, so changing it breaks compatibility.
pub const DEFAULT_PASSPHRASE: &str = "crate_passphrase";

/// The symmetric key protecting license payloads, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Uses the UTF-8 bytes of `passphrase` directly as key material.
    ///
    /// The passphrase must be exactly [`KEY_SIZE`] bytes long.
    pub fn from_passphrase(passphrase: &str) -> CryptoResult<Self> {
        let raw = passphrase.as_bytes();
        let bytes: [u8; KEY_SIZE] = raw.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: raw.len(),
        })?;
        Ok(Self { bytes })
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Default for SymmetricKey {
    fn default() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(DEFAULT_PASSPHRASE.as_bytes());
        Self { bytes }
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// An RSA key pair.
#[derive(Clone)]
pub struct KeyPair {
    public: RsaPublicKey,
    private: RsaPrivateKey,
}

impl KeyPair {
    /// Generates a fresh [`RSA_KEY_BITS`] key pair from the OS RNG.
    pub fn generate() -> CryptoResult<Self> {
        let private = RsaPrivateKey::new(&mut rand::rngs::OsRng, RSA_KEY_BITS)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        let public = RsaPublicKey::from(&private);
        Ok(Self { public, private })
    }

    /// Rebuilds a pair from its private half.
    pub fn from_private_key(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        Self { public, private }
    }

    /// Returns the public key.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    /// Returns the private key.
    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }

    /// Writes both halves to disk in their exchange formats.
    pub fn write_to_files(&self, public_path: &Path, private_path: &Path) -> CryptoResult<()> {
        fs::write(public_path, public_key_to_der(&self.public)?)?;
        fs::write(private_path, private_key_to_der(&self.private)?)?;
        Ok(())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("private", &"[REDACTED]")
            .finish()
    }
}

/// Imports a public key from SubjectPublicKeyInfo DER.
pub fn public_key_from_der(bytes: &[u8]) -> CryptoResult<RsaPublicKey> {
    RsaPublicKey::from_public_key_der(bytes).map_err(|e| CryptoError::KeyEncoding(e.to_string()))
}

/// Imports a private key from PKCS#8 DER.
pub fn private_key_from_der(bytes: &[u8]) -> CryptoResult<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_der(bytes).map_err(|e| CryptoError::KeyEncoding(e.to_string()))
}

/// Exports a public key as SubjectPublicKeyInfo DER.
pub fn public_key_to_der(key: &RsaPublicKey) -> CryptoResult<Vec<u8>> {
    let doc = key
        .to_public_key_der()
        .map_err(|e| CryptoError::KeyEncoding(e.to_string()))?;
    Ok(doc.as_bytes().to_vec())
}

/// Exports a private key as PKCS#8 DER.
pub fn private_key_to_der(key: &RsaPrivateKey) -> CryptoResult<Vec<u8>> {
    let doc = key
        .to_pkcs8_der()
        .map_err(|e| CryptoError::KeyEncoding(e.to_string()))?;
    Ok(doc.as_bytes().to_vec())
}

/// Reads a DER public key file.
pub fn read_public_key(path: &Path) -> CryptoResult<RsaPublicKey> {
    public_key_from_der(&fs::read(path)?)
}

/// Reads a DER private key file.
pub fn read_private_key(path: &Path) -> CryptoResult<RsaPrivateKey> {
    private_key_from_der(&fs::read(path)?)
}
