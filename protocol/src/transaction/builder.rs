//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] collects consumed states, produced states and
//! one command, then `.build()` returns an unsigned [`WireTransaction`] with
//! a deterministic id derived from its contents.
//!
//! The builder does not sign. That happens through
//! [`crate::ledger::SigningService`], so construction stays testable without
//! key material.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::verification::TransactionError;
use crate::config::TRANSACTION_VERSION;
use crate::contract::{ContractError, TicketCommand};
use crate::crypto::hash::double_sha256;
use crate::crypto::keys::PublicKey;
use crate::identity::Party;
use crate::state::{StateAndRef, StateRef, TicketState, TransactionState, TxId};

// ---------------------------------------------------------------------------
// CommandData
// ---------------------------------------------------------------------------

/// The command attached to a transaction: a wire kind plus the keys that
/// are declared as signers.
///
/// `kind` is a free string so that a peer's unknown command survives
/// decoding and is rejected by the contract with a proper error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandData {
    pub kind: String,
    pub signers: BTreeSet<PublicKey>,
}

impl CommandData {
    pub fn new(kind: impl Into<String>, signers: impl IntoIterator<Item = PublicKey>) -> Self {
        Self {
            kind: kind.into(),
            signers: signers.into_iter().collect(),
        }
    }

    /// Parsed command, if the kind is part of the ticket vocabulary.
    pub fn command(&self) -> Result<TicketCommand, ContractError> {
        TicketCommand::from_wire(&self.kind)
    }
}

// ---------------------------------------------------------------------------
// WireTransaction
// ---------------------------------------------------------------------------

/// An unsigned ticket transaction.
///
/// The `id` is the double-SHA-256 of [`WireTransaction::canonical_bytes`],
/// which covers every other field. Signatures are taken over the id, so it
/// never changes once built.
///
/// `privacy_salt` is random per build. Two proposals with identical content
/// (e.g. two parties racing to transfer the same ticket to the same new
/// holder) still get distinct ids, so the notary can tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTransaction {
    pub id: TxId,
    pub version: u16,
    pub notary: Party,
    pub inputs: Vec<StateAndRef>,
    pub outputs: Vec<TicketState>,
    pub command: CommandData,
    pub privacy_salt: [u8; 32],
}

impl WireTransaction {
    /// Deterministic bytes over all fields except `id`.
    ///
    /// Strings are NUL-terminated, counts and integers are fixed-width
    /// little-endian. serde output is not used because its field order is
    /// not a stable contract across formats.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(512);

        buf.extend_from_slice(&self.version.to_le_bytes());
        push_party(&mut buf, &self.notary);

        buf.extend_from_slice(&(self.inputs.len() as u32).to_le_bytes());
        for input in &self.inputs {
            buf.extend_from_slice(input.reference.tx_id.as_bytes());
            buf.extend_from_slice(&input.reference.index.to_le_bytes());
            input.state.data.canonical_bytes(&mut buf);
            push_party(&mut buf, &input.state.notary);
        }

        buf.extend_from_slice(&(self.outputs.len() as u32).to_le_bytes());
        for output in &self.outputs {
            output.canonical_bytes(&mut buf);
        }

        buf.extend_from_slice(self.command.kind.as_bytes());
        buf.push(0x00);
        buf.extend_from_slice(&(self.command.signers.len() as u32).to_le_bytes());
        for signer in &self.command.signers {
            buf.extend_from_slice(signer.as_bytes());
        }

        buf.extend_from_slice(&self.privacy_salt);
        buf
    }

    /// Recompute the id from the current field values.
    pub fn compute_id(&self) -> TxId {
        TxId::from_bytes(double_sha256(&self.canonical_bytes()))
    }

    /// `true` if the stored id matches the content.
    pub fn id_matches(&self) -> bool {
        self.id == self.compute_id()
    }

    /// The ticket data of every consumed state.
    pub fn input_states(&self) -> Vec<&TicketState> {
        self.inputs.iter().map(StateAndRef::ticket).collect()
    }

    /// References of every consumed state.
    pub fn input_refs(&self) -> Vec<StateRef> {
        self.inputs.iter().map(|i| i.reference).collect()
    }

    /// Produced states, addressed by this transaction's id.
    pub fn output_states(&self) -> Vec<StateAndRef> {
        self.outputs
            .iter()
            .enumerate()
            .map(|(index, data)| StateAndRef {
                state: TransactionState {
                    data: data.clone(),
                    notary: self.notary.clone(),
                },
                reference: StateRef::new(self.id, index as u32),
            })
            .collect()
    }

    /// Keys the contract demands for this transaction's command.
    pub fn required_signers(&self) -> Result<BTreeSet<PublicKey>, ContractError> {
        let cmd = self.command.command()?;
        Ok(cmd.required_signers(&self.input_states(), &self.outputs))
    }

    /// Every party named in a consumed or produced state.
    pub fn participants(&self) -> BTreeSet<Party> {
        self.inputs
            .iter()
            .flat_map(|i| i.ticket().participants())
            .chain(self.outputs.iter().flat_map(TicketState::participants))
            .collect()
    }
}

fn push_party(buf: &mut Vec<u8>, party: &Party) {
    buf.extend_from_slice(party.name().as_bytes());
    buf.push(0x00);
    buf.extend_from_slice(party.owning_key().as_bytes());
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for unsigned [`WireTransaction`]s.
///
/// ```rust,no_run
/// use ticket_protocol::contract::TicketCommand;
/// use ticket_protocol::identity::PartyKeys;
/// use ticket_protocol::state::{AssetId, Section, TicketState};
/// use ticket_protocol::transaction::TransactionBuilder;
///
/// let notary = PartyKeys::generate("O=Notary").party;
/// let issuer = PartyKeys::generate("O=Venue").party;
/// let holder = PartyKeys::generate("O=Fan").party;
///
/// let tx = TransactionBuilder::new(notary)
///     .add_output(TicketState::new(issuer.clone(), holder, Section::Med, AssetId::generate()))
///     .command(TicketCommand::Issue, [issuer.owning_key()])
///     .build()
///     .unwrap();
/// ```
pub struct TransactionBuilder {
    notary: Party,
    inputs: Vec<StateAndRef>,
    outputs: Vec<TicketState>,
    command: Option<CommandData>,
    privacy_salt: Option<[u8; 32]>,
}

impl TransactionBuilder {
    pub fn new(notary: Party) -> Self {
        Self {
            notary,
            inputs: Vec::new(),
            outputs: Vec::new(),
            command: None,
            privacy_salt: None,
        }
    }

    /// Consume a live state.
    pub fn add_input(mut self, input: StateAndRef) -> Self {
        self.inputs.push(input);
        self
    }

    /// Produce a new state.
    pub fn add_output(mut self, output: TicketState) -> Self {
        self.outputs.push(output);
        self
    }

    /// Attach the command with its declared signers. Replaces any earlier
    /// command.
    pub fn command(
        self,
        command: TicketCommand,
        signers: impl IntoIterator<Item = PublicKey>,
    ) -> Self {
        self.raw_command(command.wire_id(), signers)
    }

    /// Attach a command by wire kind, without checking it is known.
    pub fn raw_command(
        mut self,
        kind: impl Into<String>,
        signers: impl IntoIterator<Item = PublicKey>,
    ) -> Self {
        self.command = Some(CommandData::new(kind, signers));
        self
    }

    /// Fix the privacy salt. Only useful for reproducible ids in tests.
    pub fn privacy_salt(mut self, salt: [u8; 32]) -> Self {
        self.privacy_salt = Some(salt);
        self
    }

    /// Produce the unsigned transaction.
    ///
    /// # Errors
    ///
    /// [`TransactionError::MissingCommand`] if no command was attached.
    pub fn build(self) -> Result<WireTransaction, TransactionError> {
        let command = self.command.ok_or(TransactionError::MissingCommand)?;
        let privacy_salt = self.privacy_salt.unwrap_or_else(|| {
            let mut salt = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut salt);
            salt
        });

        let mut tx = WireTransaction {
            id: TxId::from_bytes([0u8; 32]),
            version: TRANSACTION_VERSION,
            notary: self.notary,
            inputs: self.inputs,
            outputs: self.outputs,
            command,
            privacy_salt,
        };
        tx.id = tx.compute_id();
        Ok(tx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
