//! Error types of the ledger collaborators.

use thiserror::Error;

use crate::crypto::keys::PublicKey;
use crate::state::{StateRef, TxId};
use crate::transaction::TransactionError;

/// Failures of a [`super::LedgerStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The record's stored id does not match its content.
    #[error("refusing to record transaction {0}: id does not match content")]
    InvalidRecord(TxId),

    /// The backing store failed.
    #[error("ledger storage failure: {0}")]
    Storage(String),
}

/// Failures of a [`super::NotaryService`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotaryError {
    /// An input was already consumed by a different transaction.
    #[error("state {state_ref} already consumed by {consumed_by}")]
    Conflict { state_ref: StateRef, consumed_by: TxId },

    /// The transaction names another notary.
    #[error("transaction is assigned to a different notary")]
    WrongNotary,

    /// The transaction failed verification at the notary.
    #[error("notarisation refused: {0}")]
    Invalid(#[from] TransactionError),
}

/// Failures of a [`super::Session`] or of [`super::Messaging`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No node is registered under this party.
    #[error("unknown party: {0}")]
    UnknownParty(String),

    /// The party is already registered on the network.
    #[error("party already registered: {0}")]
    AlreadyRegistered(String),

    /// The other side dropped the session.
    #[error("session closed by counterparty")]
    Closed,

    /// No message arrived within the timeout.
    #[error("no message within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// A message could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),
}

/// Failures of a [`super::SigningService`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    /// The service holds no private key for this public key.
    #[error("no signing key for {0}")]
    UnknownKey(PublicKey),
}
