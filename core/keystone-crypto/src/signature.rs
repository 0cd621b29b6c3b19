//! Hash-then-sign with RSA PKCS#1 v1.5 over SHA-512.
//!
//! Callers that follow the license protocol feed [`digest`] output into
//! [`sign`] and [`verify`]; both sides must do the same or every enterprise
//! license fails verification.

use crate::error::{CryptoError, CryptoResult};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256, Sha512};

/// Length of [`digest`] output in bytes.
pub const DIGEST_SIZE: usize = 32;

/// SHA-256 of `data`.
pub fn digest(data: &[u8]) -> [u8; DIGEST_SIZE] {
    Sha256::digest(data).into()
}

/// Signs `data` with SHA512withRSA.
pub fn sign(data: &[u8], private_key: &RsaPrivateKey) -> CryptoResult<Vec<u8>> {
    let signing_key = SigningKey::<Sha512>::new(private_key.clone());
    let signature = signing_key
        .try_sign(data)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;
    Ok(signature.to_vec())
}

/// Checks a SHA512withRSA signature. Malformed signatures are `false`.
pub fn verify(data: &[u8], signature: &[u8], public_key: &RsaPublicKey) -> bool {
    let Ok(signature) = Signature::try_from(signature) else {
        return false;
    };
    VerifyingKey::<Sha512>::new(public_key.clone())
        .verify(data, &signature)
        .is_ok()
}
