//! Error types of the signing sagas.
//!
//! Every saga failure is terminal. [`FlowError::kind`] groups the variants
//! so that callers can tell a counterparty's refusal from an invalid
//! proposal, a lost race or an infrastructure fault.

use thiserror::Error;

use super::progress::SagaState;
use crate::contract::ContractError;
use crate::crypto::keys::PublicKey;
use crate::ledger::{FlowKind, LedgerError, NotaryError, SessionError, SigningError};
use crate::state::{AssetId, StateRef, TxId};
use crate::transaction::{FinalityError, TransactionError};

/// Errors that can end a saga or a responder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// A contract or proposal rule does not hold. Carries the rule text.
    #[error("validation failure: {0}")]
    ValidationFailure(String),

    /// A counterparty refused to sign.
    #[error("{party} refused to sign: {reason}")]
    CounterpartySignatureRejected { party: String, reason: String },

    /// The notary has already seen another transaction consume this input.
    #[error("state {state_ref} already consumed by {consumed_by}")]
    Conflict { state_ref: StateRef, consumed_by: TxId },

    /// No live state exists for this asset.
    #[error("no live ticket with asset id {0}")]
    AssetNotFound(AssetId),

    /// The command kind is not part of the ticket vocabulary.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The ledger holds more than one live state for an asset.
    #[error("ledger holds {live} live states for asset {asset_id}")]
    LedgerContractViolation { asset_id: AssetId, live: usize },

    /// The network map lists no notary.
    #[error("no notary available")]
    NoNotaryAvailable,

    /// A session receive did not complete in time.
    #[error("counterparty {party} did not respond within {timeout_ms}ms")]
    Timeout { party: String, timeout_ms: u64 },

    /// The session layer failed.
    #[error("session error: {0}")]
    Session(SessionError),

    /// Our signing service could not sign.
    #[error("signing error: {0}")]
    Signing(#[from] SigningError),

    /// A signature did not verify, or was by an unexpected key.
    #[error("invalid signature by {by}")]
    InvalidSignature { by: PublicKey },

    /// The ledger store failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The notary refused for a reason other than a conflict.
    #[error("notary error: {0}")]
    Notary(NotaryError),

    /// Id, notary or signature-set check on a transaction failed.
    #[error("transaction error: {0}")]
    Transaction(TransactionError),

    /// The finalized record sent to us does not check out.
    #[error("finality error: {0}")]
    Finality(FinalityError),

    /// A transaction names a notary that is not on our network map.
    #[error("notary {notary} is not trusted")]
    UntrustedNotary { notary: String },

    /// A session carried a transaction of another kind than it was opened for.
    #[error("{got} transaction in a {expected} session")]
    FlowMismatch { expected: FlowKind, got: FlowKind },

    /// The peer sent a message that does not fit the protocol step.
    #[error("unexpected {got} message, expected {expected}")]
    UnexpectedMessage {
        expected: &'static str,
        got: &'static str,
    },

    /// Illegal saga state transition.
    #[error("illegal saga transition from {from} to {to}")]
    InvalidState { from: SagaState, to: SagaState },
}

/// Coarse classification of a [`FlowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowErrorKind {
    /// The proposal is structurally invalid or uses an unknown command.
    Invalid,
    /// A counterparty declined under its admission policy or checks.
    Rejected,
    /// Another transaction won the race for an input.
    Conflict,
    /// The asset has no live state.
    NotFound,
    /// The peer did not respond in time.
    Timeout,
    /// A peer broke the protocol: bad signature, wrong message, bad record.
    Protocol,
    /// Local infrastructure failed: session layer, signer, ledger, notary.
    Infrastructure,
    /// The ledger is in a state that should be impossible.
    Corruption,
    /// A bug in the saga's own sequencing.
    Internal,
}

impl FlowError {
    pub fn kind(&self) -> FlowErrorKind {
        match self {
            Self::ValidationFailure(_) | Self::UnknownCommand(_) | Self::Transaction(_) => {
                FlowErrorKind::Invalid
            }
            Self::CounterpartySignatureRejected { .. } => FlowErrorKind::Rejected,
            Self::Conflict { .. } => FlowErrorKind::Conflict,
            Self::AssetNotFound(_) => FlowErrorKind::NotFound,
            Self::Timeout { .. } => FlowErrorKind::Timeout,
            Self::InvalidSignature { .. }
            | Self::Finality(_)
            | Self::UntrustedNotary { .. }
            | Self::FlowMismatch { .. }
            | Self::UnexpectedMessage { .. } => FlowErrorKind::Protocol,
            Self::NoNotaryAvailable
            | Self::Session(_)
            | Self::Signing(_)
            | Self::Ledger(_)
            | Self::Notary(_) => FlowErrorKind::Infrastructure,
            Self::LedgerContractViolation { .. } => FlowErrorKind::Corruption,
            Self::InvalidState { .. } => FlowErrorKind::Internal,
        }
    }

    /// Attribute a session failure to the party on the other end.
    pub(crate) fn from_session(err: SessionError, party: &str) -> Self {
        match err {
            SessionError::Timeout { timeout_ms } => Self::Timeout {
                party: party.to_string(),
                timeout_ms,
            },
            other => Self::Session(other),
        }
    }
}

impl From<ContractError> for FlowError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::ValidationFailure(rule) => Self::ValidationFailure(rule),
            ContractError::UnknownCommand(kind) => Self::UnknownCommand(kind),
        }
    }
}

impl From<TransactionError> for FlowError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::Contract(inner) => inner.into(),
            TransactionError::InvalidSignature { by } => Self::InvalidSignature { by },
            other => Self::Transaction(other),
        }
    }
}

impl From<FinalityError> for FlowError {
    fn from(err: FinalityError) -> Self {
        match err {
            FinalityError::Transaction(inner @ TransactionError::Contract(_)) => inner.into(),
            other => Self::Finality(other),
        }
    }
}

impl From<NotaryError> for FlowError {
    fn from(err: NotaryError) -> Self {
        match err {
            NotaryError::Conflict {
                state_ref,
                consumed_by,
            } => Self::Conflict {
                state_ref,
                consumed_by,
            },
            NotaryError::Invalid(inner) => inner.into(),
            other => Self::Notary(other),
        }
    }
}

impl From<SessionError> for FlowError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}
