//! Password digest
//!
//! One-way SHA-256 digest, hex encoded. The same function is used when an
//! account is registered and when a sign-in attempt is checked.
//!
//! No salt is applied, so equal passwords produce equal digests.

use sha2::{Digest, Sha256};

/// Length of a digest string (32 bytes, hex encoded)
pub const DIGEST_LEN: usize = 64;

/// Digest a plaintext password
pub fn digest(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}

/// Check a plaintext password against a stored digest
pub fn matches(plaintext: &str, stored_digest: &str) -> bool {
    digest(plaintext) == stored_digest
}
