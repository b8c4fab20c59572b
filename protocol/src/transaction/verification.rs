//! Transaction verification: structural, contract and signature checks.
//!
//! Every party runs [`verify_transaction`] on every proposal it is shown,
//! and the notary runs [`verify_signed_transaction`] before it commits
//! anything. Checks run cheapest first: id recomputation, notary
//! consistency, the contract, then signatures.

use thiserror::Error;

use super::builder::WireTransaction;
use super::signing::SignedTransaction;
use crate::contract::{ContractError, TicketContract};
use crate::crypto::keys::PublicKey;
use crate::state::{StateRef, TxId};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during transaction construction or verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// The stored id does not match the double-SHA-256 of the content.
    #[error("transaction id mismatch: expected {expected}, got {actual}")]
    IdMismatch { expected: TxId, actual: TxId },

    /// The builder was finished without a command.
    #[error("transaction has no command")]
    MissingCommand,

    /// A consumed state is sequenced by a different notary than the one
    /// named on the transaction.
    #[error("input {state_ref} is not controlled by the transaction notary")]
    NotaryMismatch { state_ref: StateRef },

    /// The ticket contract rejected the transition.
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// Declared signers whose signatures are absent.
    #[error("missing signatures from {} key(s)", .missing.len())]
    MissingSignatures { missing: Vec<PublicKey> },

    /// An attached signature does not verify over the id.
    #[error("invalid signature by {by}")]
    InvalidSignature { by: PublicKey },
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify an unsigned transaction.
///
/// 1. **Id** must equal the double-SHA-256 of the canonical bytes.
/// 2. **Notary**: every input must name the transaction's notary.
/// 3. **Contract**: [`TicketContract::verify`] must accept the transition.
pub fn verify_transaction(tx: &WireTransaction) -> Result<(), TransactionError> {
    let expected = tx.compute_id();
    if tx.id != expected {
        return Err(TransactionError::IdMismatch {
            expected,
            actual: tx.id,
        });
    }

    if let Some(input) = tx.inputs.iter().find(|i| i.state.notary != tx.notary) {
        return Err(TransactionError::NotaryMismatch {
            state_ref: input.reference,
        });
    }

    TicketContract::verify(tx)?;
    Ok(())
}

/// Verify a fully signed transaction: [`verify_transaction`] plus a valid
/// signature from every declared signer.
pub fn verify_signed_transaction(stx: &SignedTransaction) -> Result<(), TransactionError> {
    verify_transaction(&stx.tx)?;
    stx.verify_required_signatures()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
