//! Saga progress: a small state machine published on a watch channel.
//!
//! ```text
//! Proposed ─► LocallyVerified ─► LocallySigned ─┬─► CounterSigned ─► Finalized
//!                                               └──────────────────► Finalized
//!     any non-terminal state ─► Aborted
//! ```
//!
//! `Finalized` and `Aborted` are terminal and never change again.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;

use super::error::FlowError;

/// Where a signing saga currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SagaState {
    /// The transaction has been built.
    Proposed,
    /// Our own contract check passed.
    LocallyVerified,
    /// We have signed.
    LocallySigned,
    /// Every counterparty has signed.
    CounterSigned,
    /// Terminal: notarised and recorded.
    Finalized,
    /// Terminal: the saga failed.
    Aborted,
}

impl SagaState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finalized | Self::Aborted)
    }

    /// `true` if moving from `self` to `next` is allowed.
    pub fn can_advance_to(self, next: SagaState) -> bool {
        use SagaState::*;
        match (self, next) {
            (Finalized | Aborted, _) => false,
            (_, Aborted) => true,
            (Proposed, LocallyVerified)
            | (LocallyVerified, LocallySigned)
            | (LocallySigned, CounterSigned)
            | (LocallySigned, Finalized)
            | (CounterSigned, Finalized) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SagaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Proposed => "Proposed",
            Self::LocallyVerified => "LocallyVerified",
            Self::LocallySigned => "LocallySigned",
            Self::CounterSigned => "CounterSigned",
            Self::Finalized => "Finalized",
            Self::Aborted => "Aborted",
        };
        write!(f, "{}", label)
    }
}

/// Owns a saga's state and broadcasts every transition.
pub struct SagaProgress {
    tx: watch::Sender<SagaState>,
}

impl Default for SagaProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl SagaProgress {
    /// Start in [`SagaState::Proposed`].
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SagaState::Proposed);
        Self { tx }
    }

    pub fn current(&self) -> SagaState {
        *self.tx.borrow()
    }

    /// A receiver that sees the current state and every later one.
    pub fn subscribe(&self) -> watch::Receiver<SagaState> {
        self.tx.subscribe()
    }

    /// Move to `next`.
    ///
    /// # Errors
    ///
    /// [`FlowError::InvalidState`] if the transition is not allowed; the
    /// state is left unchanged.
    pub fn advance(&self, next: SagaState) -> Result<(), FlowError> {
        let from = self.current();
        if !from.can_advance_to(next) {
            return Err(FlowError::InvalidState { from, to: next });
        }
        self.tx.send_replace(next);
        Ok(())
    }

    /// Move to [`SagaState::Aborted`] unless already terminal.
    pub fn abort(&self) {
        let _ = self.advance(SagaState::Aborted);
    }
}
