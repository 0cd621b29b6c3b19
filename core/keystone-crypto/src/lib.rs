//! Cryptographic primitives for Keystone licensing.
//!
//! - **Cipher**: AES-128/ECB/PKCS#7 payload encryption under a configured key
//! - **Signature**: SHA-256 digest, then SHA512withRSA sign/verify
//! - **Key material**: RSA-2048 generation, DER import/export, key files
//!
//! Everything is synchronous and CPU-bound; it is safe to call from event
//! handling threads.

mod cipher;
mod error;
mod key;
mod provider;
mod signature;

pub use cipher::{BLOCK_SIZE, decrypt, encrypt};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    DEFAULT_PASSPHRASE, KEY_SIZE, KeyPair, RSA_KEY_BITS, SymmetricKey, private_key_from_der,
    private_key_to_der, public_key_from_der, public_key_to_der, read_private_key,
    read_public_key,
};
pub use provider::CryptoProvider;
pub use signature::{DIGEST_SIZE, digest, sign, verify};

pub use rsa::{RsaPrivateKey, RsaPublicKey};
