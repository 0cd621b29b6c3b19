//! License envelopes, payloads and verification for Keystone clusters.
//!
//! This crate handles:
//! - Encoding license envelopes (type, version, ciphertext) to bytes and base64
//! - Encrypting and parsing the license payload
//! - Verifying self-generated and enterprise (RSA-signed) licenses
//! - Persisting the license as a custom object in cluster metadata
//!
//! # Trust model
//!
//! - **Self-generated** licenses are synthesized by a cluster for itself and
//!   are valid until they expire.
//! - **Enterprise** licenses are signed by the licensing authority; the
//!   signature covers the payload without its signature field.
//! - Untrusted input never panics or errors out of [`LicenseVerifier::verify`];
//!   it yields `false`.
//!
//! # Envelope Format
//!
//! `base64(version:i32 | type:i32 | len:i32 | AES(payload json))`

mod error;
mod key;
mod metadata;
mod record;
mod verifier;

pub use error::{LicenseError, LicenseResult};
pub use key::{DecodedLicense, LICENSE_VERSION, LicenseKey, LicenseType};
pub use metadata::{LicenseKeyDiff, LicenseMetadataWriter, WRITEABLE_TYPE};
pub use record::{LicenseRecord, now_millis};
pub use verifier::{LicenseVerifier, sign_license};
