//! # Digital Signatures
//!
//! Free-function wrappers over Ed25519 signing and verification.
//!
//! Transaction signatures are always taken over the 32-byte transaction id,
//! never over the full transaction body: the id already commits to every
//! field, and every party can recompute it.

use super::keys::{KeyPair, PublicKey, Signature};

/// Sign `message` with `keypair`.
pub fn sign(keypair: &KeyPair, message: &[u8]) -> Signature {
    keypair.sign(message)
}

/// Verify an Ed25519 signature. `true` iff valid; malformed input is
/// simply invalid.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    public_key.verify(message, signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let kp = KeyPair::generate();
        let sig = sign(&kp, b"hello");
        assert!(verify(&kp.public_key(), b"hello", &sig));
        assert!(!verify(&kp.public_key(), b"goodbye", &sig));
    }

    #[test]
    fn test_deterministic_signatures() {
        let kp = KeyPair::generate();
        assert_eq!(sign(&kp, b"same").as_bytes(), sign(&kp, b"same").as_bytes());
    }
}
