//! # Ticket Contract
//!
//! The ledger-wide validation engine. [`TicketContract::verify`] is a pure
//! function of a transaction's consumed states, produced states, command
//! kind and declared signer set; every party runs it independently and
//! must reach the same verdict.
//!
//! ```text
//! command.rs — TicketCommand: the wire vocabulary and signer rules
//! rules.rs   — TicketContract: per-command structural rules
//! ```
//!
//! Party-local business rules (e.g. "only accept MED tickets") are *not*
//! contract law; they live in [`crate::flows::policy`].

pub mod command;
pub mod rules;

use thiserror::Error;

pub use command::TicketCommand;
pub use rules::TicketContract;

/// Why a transaction is inadmissible under the ticket contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// A structural or signer rule does not hold. Carries the rule text.
    #[error("validation failure: {0}")]
    ValidationFailure(String),

    /// The command kind is not part of the ticket vocabulary.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

impl ContractError {
    /// The rule text or unknown kind carried by this error.
    pub fn detail(&self) -> &str {
        match self {
            Self::ValidationFailure(rule) | Self::UnknownCommand(rule) => rule,
        }
    }
}
