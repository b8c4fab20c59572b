//! # Key Management
//!
//! Ed25519 keypairs, public keys and signatures for ledger parties.
//!
//! Every party owns exactly one signing key. Its public half is the
//! party's "owning key": it is what appears in a command's required
//! signer set and what a counterparty checks a signature against.
//!
//! Key bytes are never logged. `Debug` on [`KeyPair`] prints only the
//! public half.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

/// Errors that can occur while decoding key material.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,

    #[error("invalid signature bytes: expected 64 bytes")]
    InvalidSignature,

    #[error("invalid hex encoding: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// A party's Ed25519 signing keypair.
///
/// Deliberately not `Serialize`: exporting a secret key should be an
/// explicit call to [`KeyPair::secret_key_bytes`].
pub struct KeyPair {
    signing_key: SigningKey,
}

/// The public half of a keypair. Ordered so that signer sets can be
/// kept in a `BTreeSet` and hashed deterministically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    bytes: [u8; PUBLIC_KEY_LENGTH],
}

/// An Ed25519 signature. Always 64 bytes when produced by this crate;
/// anything else simply fails verification.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    bytes: Vec<u8>,
}

impl KeyPair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic keypair from a 32-byte seed. Used by tests that need
    /// stable identities.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The public key of this pair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign arbitrary bytes.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            bytes: self.signing_key.sign(message).to_bytes().to_vec(),
        }
    }

    /// Raw secret key bytes. Handle with care.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

impl PublicKey {
    /// Decode and validate a public key from a byte slice.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] =
            slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// Parse a hex-encoded public key.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        Self::try_from_slice(&hex::decode(s)?)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    /// Verify `signature` over `message`. Returns `false` for malformed
    /// keys or signatures rather than an error.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let Some(sig) = signature.to_dalek() else {
            return false;
        };
        verifying_key.verify(message, &sig).is_ok()
    }

    /// Hex-encoded key, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

impl Signature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Parse a hex-encoded signature.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(KeyError::InvalidSignature);
        }
        Ok(Self { bytes })
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex-encoded signature, 128 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    fn to_dalek(&self) -> Option<DalekSignature> {
        let arr: [u8; SIGNATURE_LENGTH] = self.bytes.as_slice().try_into().ok()?;
        Some(DalekSignature::from_bytes(&arr))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 128 {
            write!(f, "Signature({}...{})", &hex_str[..8], &hex_str[120..])
        } else {
            write!(f, "Signature({})", hex_str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_sign_verify_roundtrip() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"transfer ticket");
        assert!(kp.public_key().verify(b"transfer ticket", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let sig = kp1.sign(b"message");
        assert!(!kp2.public_key().verify(b"message", &sig));
    }

    #[test]
    fn seeded_keypairs_are_stable() {
        let a = KeyPair::from_seed(&[7u8; 32]);
        let b = KeyPair::from_seed(&[7u8; 32]);
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.clone().public_key(), a.public_key());
    }

    #[test]
    fn public_key_hex_roundtrip() {
        let pk = KeyPair::generate().public_key();
        assert_eq!(PublicKey::from_hex(&pk.to_hex()).unwrap(), pk);
    }

    #[test]
    fn truncated_signature_fails_closed() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"msg");
        let truncated = Signature {
            bytes: sig.as_bytes()[..32].to_vec(),
        };
        assert!(!kp.public_key().verify(b"msg", &truncated));
        assert!(Signature::from_hex(&hex::encode([0u8; 10])).is_err());
    }

    #[test]
    fn debug_never_prints_secret() {
        let kp = KeyPair::from_seed(&[0xAB; 32]);
        let dbg = format!("{:?}", kp);
        assert!(!dbg.contains(&hex::encode(kp.secret_key_bytes())));
    }
}
