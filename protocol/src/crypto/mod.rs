//! # Cryptographic Primitives
//!
//! Thin, typed wrappers around audited implementations: Ed25519 via
//! `ed25519-dalek`, SHA-256 via `sha2`, BLAKE3 via `blake3`. Nothing here is
//! home-grown.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{blake3_hash, double_sha256, sha256};
pub use keys::{KeyError, KeyPair, PublicKey, Signature};
pub use signatures::{sign, verify};
