//! Payload encryption using AES-128 in ECB mode with PKCS#7 padding.
//!
//! This is the envelope format deployed clusters already hold. The key ships
//! with every node, so the cipher hides payloads from casual inspection only.
//! Authenticity comes from the RSA signature on enterprise licenses.

use crate::error::{CryptoError, CryptoResult};
use crate::key::SymmetricKey;
use aes::Aes128;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit, block_padding::Pkcs7};

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

type Aes128EcbEnc = ecb::Encryptor<Aes128>;
type Aes128EcbDec = ecb::Decryptor<Aes128>;

/// Encrypts plaintext. The output is always a non-empty multiple of
/// [`BLOCK_SIZE`].
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> Vec<u8> {
    Aes128EcbEnc::new(key.as_bytes().into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypts ciphertext produced by [`encrypt`] under the same key.
pub fn decrypt(key: &SymmetricKey, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::Decryption(format!(
            "ciphertext length {} is not a positive multiple of {BLOCK_SIZE}",
            ciphertext.len()
        )));
    }
    Aes128EcbDec::new(key.as_bytes().into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| {
            CryptoError::Decryption("bad padding (wrong key or tampered data)".to_string())
        })
}
