//! Structural and signer rules, one predicate per command.

use std::collections::BTreeSet;

use crate::crypto::keys::PublicKey;
use crate::state::{Section, TicketState};
use crate::transaction::WireTransaction;

use super::{ContractError, TicketCommand};

/// `require(cond, rule)` fails with `rule` as the validation failure text.
fn require(condition: bool, rule: &str) -> Result<(), ContractError> {
    if condition {
        Ok(())
    } else {
        Err(ContractError::ValidationFailure(rule.to_string()))
    }
}

/// The ticket contract. Stateless; all methods are associated functions.
pub struct TicketContract;

impl TicketContract {
    /// Verify a full transaction.
    pub fn verify(tx: &WireTransaction) -> Result<(), ContractError> {
        let inputs = tx.input_states();
        Self::verify_parts(&tx.command.kind, &inputs, &tx.outputs, &tx.command.signers)
    }

    /// Verify a transition given its parts directly.
    ///
    /// `signers` is the declared signer set of the command; it must be a
    /// superset of what the command requires. Whether those signatures are
    /// actually attached and valid is checked separately by
    /// [`crate::transaction::SignedTransaction::verify_required_signatures`].
    pub fn verify_parts(
        kind: &str,
        inputs: &[&TicketState],
        outputs: &[TicketState],
        signers: &BTreeSet<PublicKey>,
    ) -> Result<(), ContractError> {
        match TicketCommand::from_wire(kind)? {
            TicketCommand::Issue => verify_issue(inputs, outputs, signers),
            TicketCommand::Transfer => verify_transfer(inputs, outputs, signers),
            TicketCommand::Retire => verify_retire(inputs, outputs, signers),
        }
    }
}

fn verify_output_invariants(output: &TicketState) -> Result<(), ContractError> {
    require(
        output.issuer.owning_key() != output.holder.owning_key(),
        "issuer and holder cannot be equal",
    )?;
    require(
        Section::from_value(output.section).is_some(),
        "section must be 15, 30, or 50",
    )
}

fn verify_issue(
    inputs: &[&TicketState],
    outputs: &[TicketState],
    signers: &BTreeSet<PublicKey>,
) -> Result<(), ContractError> {
    require(inputs.is_empty(), "no inputs may be consumed when issuing")?;
    require(outputs.len() == 1, "exactly one output must be issued")?;
    let output = &outputs[0];
    verify_output_invariants(output)?;

    let required = TicketCommand::Issue.required_signers(inputs, outputs);
    require(required.is_subset(signers), "issuer must sign the issuance")
}

fn verify_transfer(
    inputs: &[&TicketState],
    outputs: &[TicketState],
    signers: &BTreeSet<PublicKey>,
) -> Result<(), ContractError> {
    require(
        inputs.len() == 1,
        "exactly one input must be consumed by a transfer",
    )?;
    require(
        outputs.len() == 1,
        "exactly one output must be produced by a transfer",
    )?;
    let input = inputs[0];
    let output = &outputs[0];

    require(
        input.issuer.owning_key() == output.issuer.owning_key(),
        "issuer must be conserved in a transfer",
    )?;
    require(
        input.holder.owning_key() != output.holder.owning_key(),
        "old and new holder cannot be equal",
    )?;
    require(
        input.section == output.section,
        "section must be conserved in a transfer",
    )?;
    require(
        input.asset_id == output.asset_id,
        "asset id must be conserved in a transfer",
    )?;
    verify_output_invariants(output)?;

    let required = TicketCommand::Transfer.required_signers(inputs, outputs);
    require(
        required.is_subset(signers),
        "old and new holder must both sign a transfer",
    )
}

fn verify_retire(
    inputs: &[&TicketState],
    outputs: &[TicketState],
    signers: &BTreeSet<PublicKey>,
) -> Result<(), ContractError> {
    require(inputs.len() == 1, "exactly one input must be retired")?;
    require(outputs.is_empty(), "no outputs may be produced when retiring")?;

    let required = TicketCommand::Retire.required_signers(inputs, outputs);
    require(
        required.is_subset(signers),
        "issuer and holder must both sign a retirement",
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
