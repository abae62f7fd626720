//! Hashing helpers for config fingerprints.

use sha2::{Digest, Sha256};

/// Prefix marking a config fingerprint.
pub const FINGERPRINT_PREFIX: &str = "sha256:";

/// Computes SHA-256 hash of data and returns hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Computes SHA-256 hash of a string.
pub fn sha256_str(s: &str) -> String {
    sha256_hex(s.as_bytes())
}

/// Formats a hex digest as a fingerprint.
pub fn fingerprint(hex_digest: &str) -> String {
    format!("{}{}", FINGERPRINT_PREFIX, hex_digest)
}
