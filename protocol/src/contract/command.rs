//! Ticket commands and their wire identifiers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::config::{COMMAND_ISSUE, COMMAND_RETIRE, COMMAND_TRANSFER};
use crate::crypto::keys::PublicKey;
use crate::state::TicketState;

use super::ContractError;

/// The three transitions a ticket can undergo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketCommand {
    /// Create a ticket: nothing consumed, one version produced.
    Issue,
    /// Change the holder: one version consumed, one produced.
    Transfer,
    /// Destroy the ticket: one version consumed, nothing produced.
    Retire,
}

impl TicketCommand {
    /// String attached to every transaction record on the wire.
    pub fn wire_id(self) -> &'static str {
        match self {
            Self::Issue => COMMAND_ISSUE,
            Self::Transfer => COMMAND_TRANSFER,
            Self::Retire => COMMAND_RETIRE,
        }
    }

    /// Parse a wire identifier.
    ///
    /// # Errors
    ///
    /// [`ContractError::UnknownCommand`] for anything outside the ticket
    /// vocabulary.
    pub fn from_wire(kind: &str) -> Result<Self, ContractError> {
        match kind {
            COMMAND_ISSUE => Ok(Self::Issue),
            COMMAND_TRANSFER => Ok(Self::Transfer),
            COMMAND_RETIRE => Ok(Self::Retire),
            other => Err(ContractError::UnknownCommand(other.to_string())),
        }
    }

    /// Keys whose signatures the contract demands for this command.
    ///
    /// Issue needs the issuer; Transfer needs the old and new holder but
    /// not the issuer; Retire needs both participants of the consumed
    /// state. Missing inputs or outputs yield an empty contribution, which
    /// the structural rules reject separately.
    pub fn required_signers(
        self,
        inputs: &[&TicketState],
        outputs: &[TicketState],
    ) -> BTreeSet<PublicKey> {
        match self {
            Self::Issue => outputs.iter().map(|o| o.issuer.owning_key()).collect(),
            Self::Transfer => inputs
                .iter()
                .map(|i| i.holder.owning_key())
                .chain(outputs.iter().map(|o| o.holder.owning_key()))
                .collect(),
            Self::Retire => inputs
                .iter()
                .flat_map(|i| i.participants())
                .map(|p| p.owning_key())
                .collect(),
        }
    }
}

impl fmt::Display for TicketCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Issue => write!(f, "Issue"),
            Self::Transfer => write!(f, "Transfer"),
            Self::Retire => write!(f, "Retire"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PartyKeys;
    use crate::state::{AssetId, Section};

    #[test]
    fn wire_ids_parse_back() {
        for cmd in [TicketCommand::Issue, TicketCommand::Transfer, TicketCommand::Retire] {
            assert_eq!(TicketCommand::from_wire(cmd.wire_id()).unwrap(), cmd);
        }
    }

    #[test]
    fn unrecognised_kind_is_unknown_command() {
        let err = TicketCommand::from_wire("ticket.resell").unwrap_err();
        assert_eq!(err, ContractError::UnknownCommand("ticket.resell".into()));
    }

    #[test]
    fn transfer_signers_exclude_issuer_but_retire_signers_include_it() {
        let a = PartyKeys::generate("O=Alice").party;
        let b = PartyKeys::generate("O=Bob").party;
        let c = PartyKeys::generate("O=Carol").party;
        let input = TicketState::new(a.clone(), b.clone(), Section::Med, AssetId::generate());
        let output = input.with_new_holder(c.clone());

        let transfer = TicketCommand::Transfer.required_signers(&[&input], &[output]);
        assert_eq!(
            transfer,
            BTreeSet::from([b.owning_key(), c.owning_key()])
        );
        assert!(!transfer.contains(&a.owning_key()));

        let retire = TicketCommand::Retire.required_signers(&[&input], &[]);
        assert_eq!(retire, BTreeSet::from([a.owning_key(), b.owning_key()]));
    }
}
