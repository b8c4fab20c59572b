//! # Hashing Utilities
//!
//! Two hash functions, each with one job:
//!
//! - **double SHA-256** derives transaction ids from canonical transaction
//!   bytes. Every party recomputes it independently, so the construction
//!   must never change within a protocol major version.
//! - **BLAKE3** fingerprints party keys for display and log correlation.

use sha2::{Digest, Sha256};

use crate::config::TX_ID_LENGTH;

/// SHA-256 of `data` as a fixed-size array.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// `SHA-256(SHA-256(data))`, the transaction id construction.
pub fn double_sha256(data: &[u8]) -> [u8; TX_ID_LENGTH] {
    sha256(&sha256(data))
}

/// BLAKE3 digest of `data`.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256("") from FIPS 180-2.
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_double_sha256_differs_from_single() {
        let data = b"ticket transaction bytes";
        assert_ne!(double_sha256(data), sha256(data));
        assert_eq!(double_sha256(data), sha256(&sha256(data)));
    }

    #[test]
    fn test_blake3_deterministic() {
        assert_eq!(blake3_hash(b"alice"), blake3_hash(b"alice"));
        assert_ne!(blake3_hash(b"alice"), blake3_hash(b"bob"));
    }
}
