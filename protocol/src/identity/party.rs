//! Named ledger identities.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::crypto::hash::blake3_hash;
use crate::crypto::keys::{KeyPair, PublicKey};

/// A well-known ledger identity.
///
/// `owning_key` is the key whose signature counts as this party's consent
/// in a command's required signer set. Equality, ordering and hashing use
/// the key alone: two names bound to one key are the same party.
#[derive(Clone, Serialize, Deserialize)]
pub struct Party {
    name: String,
    owning_key: PublicKey,
}

impl Party {
    /// Bind `name` to `owning_key`.
    pub fn new(name: impl Into<String>, owning_key: PublicKey) -> Self {
        Self {
            name: name.into(),
            owning_key,
        }
    }

    /// The party's display name, e.g. `"O=Alice"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The signing key of this party.
    pub fn owning_key(&self) -> PublicKey {
        self.owning_key
    }

    /// Short BLAKE3 fingerprint of the owning key, for logs.
    pub fn fingerprint(&self) -> String {
        hex::encode(&blake3_hash(self.owning_key.as_bytes())[..6])
    }
}

impl PartialEq for Party {
    fn eq(&self, other: &Self) -> bool {
        self.owning_key == other.owning_key
    }
}

impl Eq for Party {}

impl Hash for Party {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owning_key.hash(state);
    }
}

impl PartialOrd for Party {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Party {
    fn cmp(&self, other: &Self) -> Ordering {
        self.owning_key.cmp(&other.owning_key)
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Debug for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Party({}#{})", self.name, self.fingerprint())
    }
}

/// A party together with its private key, as held by the party's own node.
#[derive(Clone, Debug)]
pub struct PartyKeys {
    pub party: Party,
    pub keypair: KeyPair,
}

impl PartyKeys {
    /// Create a fresh identity with a random key.
    pub fn generate(name: impl Into<String>) -> Self {
        let keypair = KeyPair::generate();
        Self {
            party: Party::new(name, keypair.public_key()),
            keypair,
        }
    }
}
