//! Turning a caller's intent into a concrete, unsigned transaction.

use std::collections::BTreeSet;
use tracing::{debug, error};

use super::error::FlowError;
use super::hub::ServiceHub;
use crate::contract::TicketCommand;
use crate::crypto::keys::PublicKey;
use crate::identity::Party;
use crate::state::{AssetId, StateAndRef, TicketState};
use crate::transaction::{TransactionBuilder, WireTransaction};

/// A built transaction and who has to see it.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub command: TicketCommand,
    pub tx: WireTransaction,
    /// Keys the contract requires signatures from.
    pub required_signers: BTreeSet<PublicKey>,
    /// Required signers other than us; each gets a signing session.
    pub counterparties: Vec<Party>,
    /// Parties that only receive the finalized record.
    pub observers: Vec<Party>,
}

impl Proposal {
    /// Derive the signer and audience sets of `tx` from our point of view.
    fn new(command: TicketCommand, tx: WireTransaction, us: &Party) -> Result<Self, FlowError> {
        let required_signers = tx.required_signers()?;

        let counterparties: Vec<Party> = tx
            .participants()
            .into_iter()
            .filter(|p| p != us && required_signers.contains(&p.owning_key()))
            .collect();

        let candidates: Vec<Party> = match command {
            TicketCommand::Issue => tx.outputs.iter().map(|o| o.holder.clone()).collect(),
            TicketCommand::Transfer => tx.outputs.iter().map(|o| o.issuer.clone()).collect(),
            TicketCommand::Retire => Vec::new(),
        };
        let mut observers: Vec<Party> = Vec::new();
        for party in candidates {
            if &party != us && !counterparties.contains(&party) && !observers.contains(&party) {
                observers.push(party);
            }
        }

        Ok(Self {
            command,
            tx,
            required_signers,
            counterparties,
            observers,
        })
    }

    /// Every party that receives the finalized record.
    pub fn audience(&self) -> impl Iterator<Item = &Party> {
        self.counterparties.iter().chain(self.observers.iter())
    }
}

/// Issue a fresh ticket from us to `holder`.
pub fn propose_issue(
    hub: &ServiceHub,
    holder: Party,
    section: impl Into<u32>,
) -> Result<Proposal, FlowError> {
    let notary = hub.default_notary()?.clone();
    let issuer = hub.identity.clone();
    let output = TicketState::new(issuer.clone(), holder, section, AssetId::generate());

    let tx = TransactionBuilder::new(notary)
        .add_output(output)
        .command(TicketCommand::Issue, [issuer.owning_key()])
        .build()?;
    debug!(tx_id = %tx.id, asset_id = %tx.outputs[0].asset_id, "issue proposed");
    Proposal::new(TicketCommand::Issue, tx, &hub.identity)
}

/// Move the live version of `asset_id` to `new_holder`.
pub async fn propose_transfer(
    hub: &ServiceHub,
    asset_id: AssetId,
    new_holder: Party,
) -> Result<Proposal, FlowError> {
    let input = find_unique_live(hub, &asset_id).await?;
    let old_holder = input.ticket().holder.clone();
    let output = input.ticket().with_new_holder(new_holder.clone());

    let tx = TransactionBuilder::new(input.state.notary.clone())
        .add_input(input)
        .add_output(output)
        .command(
            TicketCommand::Transfer,
            [old_holder.owning_key(), new_holder.owning_key()],
        )
        .build()?;
    debug!(tx_id = %tx.id, asset_id = %asset_id, from = %old_holder, to = %new_holder, "transfer proposed");
    Proposal::new(TicketCommand::Transfer, tx, &hub.identity)
}

/// Retire the live version of `asset_id`.
pub async fn propose_retire(hub: &ServiceHub, asset_id: AssetId) -> Result<Proposal, FlowError> {
    let input = find_unique_live(hub, &asset_id).await?;
    let signers: Vec<PublicKey> = input
        .ticket()
        .participants()
        .iter()
        .map(Party::owning_key)
        .collect();

    let tx = TransactionBuilder::new(input.state.notary.clone())
        .add_input(input)
        .command(TicketCommand::Retire, signers)
        .build()?;
    debug!(tx_id = %tx.id, asset_id = %asset_id, "retire proposed");
    Proposal::new(TicketCommand::Retire, tx, &hub.identity)
}

/// The single live state of `asset_id` in our vault.
async fn find_unique_live(hub: &ServiceHub, asset_id: &AssetId) -> Result<StateAndRef, FlowError> {
    let mut live = hub.ledger.find_live(asset_id).await?;
    match live.len() {
        0 => Err(FlowError::AssetNotFound(*asset_id)),
        1 => Ok(live.remove(0)),
        n => {
            error!(asset_id = %asset_id, live = n, "more than one live state for asset");
            Err(FlowError::LedgerContractViolation {
                asset_id: *asset_id,
                live: n,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
