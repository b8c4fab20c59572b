//! Transaction signatures and the signed-transaction envelope.
//!
//! Every party signs the 32-byte transaction id, never the body. The id
//! commits to all content, so a signature over it is a signature over the
//! whole transition.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::builder::WireTransaction;
use super::verification::TransactionError;
use crate::crypto::keys::{KeyPair, PublicKey, Signature};
use crate::crypto::signatures::{sign, verify};
use crate::state::TxId;

/// A signature by `by` over a transaction id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    pub by: PublicKey,
    pub signature: Signature,
}

impl TransactionSignature {
    /// `true` if this is a valid signature by `self.by` over `tx_id`.
    pub fn verify(&self, tx_id: &TxId) -> bool {
        verify(&self.by, tx_id.as_bytes(), &self.signature)
    }
}

/// Sign a transaction id with a local keypair.
pub fn sign_transaction(tx_id: &TxId, keypair: &KeyPair) -> TransactionSignature {
    TransactionSignature {
        by: keypair.public_key(),
        signature: sign(keypair, tx_id.as_bytes()),
    }
}

/// A wire transaction plus the signatures collected so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub tx: WireTransaction,
    pub sigs: Vec<TransactionSignature>,
}

impl SignedTransaction {
    pub fn new(tx: WireTransaction, sigs: Vec<TransactionSignature>) -> Self {
        Self { tx, sigs }
    }

    pub fn id(&self) -> TxId {
        self.tx.id
    }

    /// Attach one more signature. A second signature by the same key
    /// replaces the first.
    pub fn with_additional_signature(mut self, sig: TransactionSignature) -> Self {
        self.sigs.retain(|s| s.by != sig.by);
        self.sigs.push(sig);
        self
    }

    /// Keys that have attached a signature (valid or not).
    pub fn signers(&self) -> BTreeSet<PublicKey> {
        self.sigs.iter().map(|s| s.by).collect()
    }

    /// Declared signers that have not signed yet.
    pub fn missing_signers(&self) -> BTreeSet<PublicKey> {
        let present = self.signers();
        self.tx
            .command
            .signers
            .iter()
            .filter(|k| !present.contains(k))
            .copied()
            .collect()
    }

    /// Check every attached signature and require all declared signers to
    /// be present, except the keys in `allowed_missing`.
    ///
    /// A responder calls this with its own key as the only allowed gap;
    /// the notary and the finality check call it with an empty set.
    ///
    /// # Errors
    ///
    /// [`TransactionError::InvalidSignature`] for the first attached
    /// signature that does not verify, then
    /// [`TransactionError::MissingSignatures`] listing the absent keys.
    pub fn verify_signatures_except(
        &self,
        allowed_missing: &BTreeSet<PublicKey>,
    ) -> Result<(), TransactionError> {
        let id = self.id();
        if let Some(bad) = self.sigs.iter().find(|s| !s.verify(&id)) {
            return Err(TransactionError::InvalidSignature { by: bad.by });
        }

        let missing: Vec<PublicKey> = self
            .missing_signers()
            .into_iter()
            .filter(|k| !allowed_missing.contains(k))
            .collect();
        if !missing.is_empty() {
            return Err(TransactionError::MissingSignatures { missing });
        }
        Ok(())
    }

    /// Every declared signer has attached a valid signature.
    pub fn verify_required_signatures(&self) -> Result<(), TransactionError> {
        self.verify_signatures_except(&BTreeSet::new())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
