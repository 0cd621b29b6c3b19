//! The primitive layer handed to license code.
//!
//! A `CryptoProvider` owns the symmetric payload key so no caller reaches for
//! a process-wide constant. Asymmetric operations take their key explicitly.

use crate::cipher;
use crate::error::CryptoResult;
use crate::key::{KeyPair, SymmetricKey};
use crate::signature::{self, DIGEST_SIZE};
use rsa::{RsaPrivateKey, RsaPublicKey};

/// Cipher, digest and signature operations bound to one symmetric key.
#[derive(Debug, Clone, Default)]
pub struct CryptoProvider {
    key: SymmetricKey,
}

impl CryptoProvider {
    /// Creates a provider using `key` for payload confidentiality.
    pub fn new(key: SymmetricKey) -> Self {
        Self { key }
    }

    /// Creates a provider keyed by a 16-byte passphrase.
    pub fn from_passphrase(passphrase: &str) -> CryptoResult<Self> {
        Ok(Self::new(SymmetricKey::from_passphrase(passphrase)?))
    }

    /// Generates an RSA key pair for an issuing authority.
    pub fn generate_key_pair(&self) -> CryptoResult<KeyPair> {
        KeyPair::generate()
    }

    pub fn encrypt_payload(&self, plaintext: &[u8]) -> Vec<u8> {
        cipher::encrypt(&self.key, plaintext)
    }

    pub fn decrypt_payload(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        cipher::decrypt(&self.key, ciphertext)
    }

    pub fn digest(&self, data: &[u8]) -> [u8; DIGEST_SIZE] {
        signature::digest(data)
    }

    pub fn sign(&self, data: &[u8], private_key: &RsaPrivateKey) -> CryptoResult<Vec<u8>> {
        signature::sign(data, private_key)
    }

    pub fn verify(&self, data: &[u8], signature: &[u8], public_key: &RsaPublicKey) -> bool {
        signature::verify(data, signature, public_key)
    }
}
