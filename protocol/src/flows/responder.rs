//! The counterparty side: vet, sign, await finality, record.
//!
//! One responder runs per inbound session. What it does depends on the
//! first message:
//!
//! - `Proposal`: we are a required signer. Vet the transaction, then
//!   either refuse with `Rejected { reason }` or sign and wait for the
//!   finalized record.
//! - `Finalized`: we are an observer. Verify and record.

use std::collections::BTreeSet;
use tracing::{debug, info};

use super::error::FlowError;
use super::hub::ServiceHub;
use super::policy::AdmissionPolicy;
use crate::contract::ContractError;
use crate::ledger::{FlowKind, FlowMessage, Session, SessionInit};
use crate::state::TxId;
use crate::transaction::{
    verify_transaction, FinalizedRecord, SignedTransaction, TransactionError,
};

/// How a responder session ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderOutcome {
    /// The transaction was finalized and is now in our ledger.
    Recorded(FinalizedRecord),
    /// We declined to sign.
    Refused { reason: String },
}

/// Serve one inbound session to completion.
pub async fn respond(
    hub: &ServiceHub,
    policy: &dyn AdmissionPolicy,
    init: SessionInit,
) -> Result<ResponderOutcome, FlowError> {
    let SessionInit { flow, mut session } = init;
    let peer = session.counterparty().name().to_string();

    let first = session
        .receive_within(hub.config.session_timeout())
        .await
        .map_err(|e| FlowError::from_session(e, &peer))?;

    match first {
        FlowMessage::Proposal(stx) => sign_and_await(hub, policy, flow, session, stx).await,
        FlowMessage::Finalized(record) => {
            accept_finality(hub, flow, &record, None).await?;
            Ok(ResponderOutcome::Recorded(record))
        }
        other => Err(FlowError::UnexpectedMessage {
            expected: "proposal",
            got: other.label(),
        }),
    }
}

async fn sign_and_await(
    hub: &ServiceHub,
    policy: &dyn AdmissionPolicy,
    flow: FlowKind,
    mut session: Session,
    stx: SignedTransaction,
) -> Result<ResponderOutcome, FlowError> {
    let tx_id = stx.id();
    let peer = session.counterparty().name().to_string();

    if let Err(reason) = vet(hub, policy, flow, &stx).await {
        info!(tx_id = %tx_id, from = %peer, flow = %flow, reason = %reason, "refusing to sign");
        session
            .send(&FlowMessage::Rejected {
                reason: reason.clone(),
            })
            .await
            .map_err(|e| FlowError::from_session(e, &peer))?;
        return Ok(ResponderOutcome::Refused { reason });
    }

    let sig = hub.signer.sign(&tx_id, &hub.our_key()).await?;
    session
        .send(&FlowMessage::Signature(sig))
        .await
        .map_err(|e| FlowError::from_session(e, &peer))?;
    debug!(tx_id = %tx_id, to = %peer, "counter-signed");

    let reply = session
        .receive_within(hub.config.finality_timeout())
        .await
        .map_err(|e| FlowError::from_session(e, &peer))?;
    match reply {
        FlowMessage::Finalized(record) => {
            accept_finality(hub, flow, &record, Some(tx_id)).await?;
            Ok(ResponderOutcome::Recorded(record))
        }
        other => Err(FlowError::UnexpectedMessage {
            expected: "finalized",
            got: other.label(),
        }),
    }
}

/// Every check a counterparty runs before signing. `Err` carries the
/// reason sent back to the initiator.
async fn vet(
    hub: &ServiceHub,
    policy: &dyn AdmissionPolicy,
    flow: FlowKind,
    stx: &SignedTransaction,
) -> Result<(), String> {
    let tx = &stx.tx;
    if !tx.id_matches() {
        return Err("transaction id does not match its content".to_string());
    }
    if !hub.trusts_notary(&tx.notary) {
        return Err(format!("notary {} is not trusted", tx.notary));
    }

    let command = tx.command.command().map_err(|e| e.to_string())?;
    if FlowKind::from(command) != flow {
        return Err(format!("{} proposed in a {} session", command, flow));
    }

    let our_key = hub.our_key();
    let required = tx.required_signers().map_err(|e| e.to_string())?;
    if !required.contains(&our_key) {
        return Err("we are not a required signer".to_string());
    }

    let ours: BTreeSet<_> = [our_key].into_iter().collect();
    stx.verify_signatures_except(&ours)
        .map_err(|e| e.to_string())?;

    verify_transaction(tx).map_err(|e| match e {
        TransactionError::Contract(ContractError::ValidationFailure(rule)) => rule,
        other => other.to_string(),
    })?;

    // The initiator chose the input data; where we track the asset, it must
    // be exactly the version we hold as live.
    for input in &tx.inputs {
        let live = hub
            .ledger
            .find_live(&input.ticket().asset_id)
            .await
            .map_err(|e| e.to_string())?;
        if !live.is_empty() && !live.contains(input) {
            return Err(format!(
                "input {} does not match our live state",
                input.reference
            ));
        }
    }

    policy.check(tx)
}

/// Verify a finalized record and put it in our ledger.
async fn accept_finality(
    hub: &ServiceHub,
    flow: FlowKind,
    record: &FinalizedRecord,
    expected: Option<TxId>,
) -> Result<(), FlowError> {
    if let Some(expected) = expected {
        if record.id() != expected {
            return Err(FlowError::Transaction(TransactionError::IdMismatch {
                expected,
                actual: record.id(),
            }));
        }
    }
    let notary = &record.stx.tx.notary;
    if !hub.trusts_notary(notary) {
        return Err(FlowError::UntrustedNotary {
            notary: notary.name().to_string(),
        });
    }
    record.verify()?;
    let got = FlowKind::from(record.stx.tx.command.command()?);
    if got != flow {
        return Err(FlowError::FlowMismatch {
            expected: flow,
            got,
        });
    }
    hub.ledger.record(record).await?;
    info!(
        tx_id = %record.id(),
        party = %hub.identity,
        command = %record.stx.tx.command.kind,
        "finalized transaction recorded"
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlowConfig;
    use crate::contract::TicketCommand;
    use crate::crypto::keys::Signature;
    use crate::flows::policy::{AcceptAll, RequireSection};
    use crate::flows::{FlowErrorKind, LocalNetwork};
    use crate::identity::PartyKeys;
    use crate::ledger::{InMemoryLedger, LedgerStore, NotaryService};
    use crate::state::{AssetId, Section, StateAndRef, StateRef, TicketState, TransactionState};
    use crate::transaction::{sign_transaction, TransactionBuilder};
    use std::sync::Arc;

    struct Fixture {
        net: LocalNetwork,
        venue: PartyKeys,
        bob: PartyKeys,
        carol: PartyKeys,
        carol_vault: Arc<InMemoryLedger>,
        hub: ServiceHub,
    }

    /// Carol is the responder; Bob proposes.
    fn fixture(config: FlowConfig) -> Fixture {
        let net = LocalNetwork::new(config);
        let carol = PartyKeys::generate("O=Carol");
        let carol_vault = Arc::new(InMemoryLedger::new());
        let hub = net.hub_for(&carol, carol_vault.clone());
        Fixture {
            net,
            venue: PartyKeys::generate("O=Venue"),
            bob: PartyKeys::generate("O=Bob"),
            carol,
            carol_vault,
            hub,
        }
    }

    /// Bob → Carol transfer of a ticket of `section`, signed by Bob only.
    fn transfer_proposal(f: &Fixture, section: Section) -> SignedTransaction {
        let ticket = TicketState::new(
            f.venue.party.clone(),
            f.bob.party.clone(),
            section,
            AssetId::generate(),
        );
        let input = StateAndRef {
            state: TransactionState {
                data: ticket.clone(),
                notary: f.net.notary().party().clone(),
            },
            reference: StateRef::new(TxId::from_bytes([7u8; 32]), 0),
        };
        let tx = TransactionBuilder::new(f.net.notary().party().clone())
            .add_input(input)
            .add_output(ticket.with_new_holder(f.carol.party.clone()))
            .command(
                TicketCommand::Transfer,
                [f.bob.party.owning_key(), f.carol.party.owning_key()],
            )
            .build()
            .unwrap();
        let sig = sign_transaction(&tx.id, &f.bob.keypair);
        SignedTransaction::new(tx, vec![sig])
    }

    /// Start a responder for Carol and return Bob's end of the session.
    fn serve(
        f: &Fixture,
        flow: FlowKind,
        policy: Arc<dyn AdmissionPolicy>,
    ) -> (
        Session,
        tokio::task::JoinHandle<Result<ResponderOutcome, FlowError>>,
    ) {
        let (ours, theirs) = Session::pair(f.bob.party.clone(), f.carol.party.clone());
        let hub = f.hub.clone();
        let handle = tokio::spawn(async move {
            respond(
                &hub,
                policy.as_ref(),
                SessionInit {
                    flow,
                    session: theirs,
                },
            )
            .await
        });
        (ours, handle)
    }

    async fn expect_rejection(f: &Fixture, flow: FlowKind, policy: Arc<dyn AdmissionPolicy>, stx: SignedTransaction) -> String {
        let (mut bob, handle) = serve(f, flow, policy);
        bob.send(&FlowMessage::Proposal(stx)).await.unwrap();
        let reason = match bob.receive().await.unwrap() {
            FlowMessage::Rejected { reason } => reason,
            other => panic!("expected rejection, got {}", other.label()),
        };
        assert_eq!(
            handle.await.unwrap().unwrap(),
            ResponderOutcome::Refused {
                reason: reason.clone()
            }
        );
        reason
    }

    #[tokio::test]
    async fn signs_then_records_the_finalized_transaction() {
        let f = fixture(FlowConfig::default());
        let stx = transfer_proposal(&f, Section::Med);
        let (mut bob, handle) = serve(&f, FlowKind::Transfer, Arc::new(RequireSection(Section::Med)));

        bob.send(&FlowMessage::Proposal(stx.clone())).await.unwrap();
        let sig = match bob.receive().await.unwrap() {
            FlowMessage::Signature(sig) => sig,
            other => panic!("expected signature, got {}", other.label()),
        };
        assert_eq!(sig.by, f.carol.party.owning_key());
        assert!(sig.verify(&stx.id()));

        let full = stx.with_additional_signature(sig);
        let record = f.net.notary().notarise(&full).await.unwrap();
        bob.send(&FlowMessage::Finalized(record.clone())).await.unwrap();

        assert_eq!(
            handle.await.unwrap().unwrap(),
            ResponderOutcome::Recorded(record.clone())
        );
        let asset = record.stx.tx.outputs[0].asset_id;
        let live = f.carol_vault.find_live(&asset).await.unwrap();
        assert_eq!(live[0].ticket().holder, f.carol.party);
    }

    #[tokio::test]
    async fn policy_refusal_is_sent_back() {
        let f = fixture(FlowConfig::default());
        let stx = transfer_proposal(&f, Section::High);
        let reason = expect_rejection(
            &f,
            FlowKind::Transfer,
            Arc::new(RequireSection(Section::Med)),
            stx,
        )
        .await;
        assert_eq!(reason, "only tickets of section 30 are accepted");
    }

    #[tokio::test]
    async fn unknown_command_is_refused() {
        let f = fixture(FlowConfig::default());
        let tx = TransactionBuilder::new(f.net.notary().party().clone())
            .add_output(TicketState::new(
                f.venue.party.clone(),
                f.carol.party.clone(),
                Section::Med,
                AssetId::generate(),
            ))
            .raw_command("ticket.burn", [f.bob.party.owning_key(), f.carol.party.owning_key()])
            .build()
            .unwrap();
        let sig = sign_transaction(&tx.id, &f.bob.keypair);
        let reason = expect_rejection(
            &f,
            FlowKind::Transfer,
            Arc::new(AcceptAll),
            SignedTransaction::new(tx, vec![sig]),
        )
        .await;
        assert_eq!(reason, "unknown command: ticket.burn");
    }

    #[tokio::test]
    async fn contract_violation_is_refused_with_the_rule() {
        let f = fixture(FlowConfig::default());
        let mut stx = transfer_proposal(&f, Section::Med);
        stx.tx.outputs[0].section = Section::High.value();
        stx.tx.id = stx.tx.compute_id();
        stx.sigs = vec![sign_transaction(&stx.tx.id, &f.bob.keypair)];

        let reason = expect_rejection(&f, FlowKind::Transfer, Arc::new(AcceptAll), stx).await;
        assert_eq!(reason, "section must be conserved in a transfer");
    }

    #[tokio::test]
    async fn tampered_initiator_signature_is_refused() {
        let f = fixture(FlowConfig::default());
        let mut stx = transfer_proposal(&f, Section::Med);
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(stx.sigs[0].signature.as_bytes());
        bytes[10] ^= 0x01;
        stx.sigs[0].signature = Signature::from_bytes(bytes);

        let reason = expect_rejection(&f, FlowKind::Transfer, Arc::new(AcceptAll), stx).await;
        assert!(reason.starts_with("invalid signature by"), "{reason}");
    }

    #[tokio::test]
    async fn proposal_not_needing_us_is_refused() {
        let f = fixture(FlowConfig::default());
        let dave = PartyKeys::generate("O=Dave");
        let mut stx = transfer_proposal(&f, Section::Med);
        stx.tx.outputs[0].holder = dave.party.clone();
        stx.tx.command.signers = [f.bob.party.owning_key(), dave.party.owning_key()]
            .into_iter()
            .collect();
        stx.tx.id = stx.tx.compute_id();
        stx.sigs = vec![sign_transaction(&stx.tx.id, &f.bob.keypair)];

        let reason = expect_rejection(&f, FlowKind::Transfer, Arc::new(AcceptAll), stx).await;
        assert_eq!(reason, "we are not a required signer");
    }

    #[tokio::test]
    async fn observer_records_without_signing() {
        let f = fixture(FlowConfig::default());
        let tx = TransactionBuilder::new(f.net.notary().party().clone())
            .add_output(TicketState::new(
                f.venue.party.clone(),
                f.carol.party.clone(),
                Section::Low,
                AssetId::generate(),
            ))
            .command(TicketCommand::Issue, [f.venue.party.owning_key()])
            .build()
            .unwrap();
        let sig = sign_transaction(&tx.id, &f.venue.keypair);
        let record = f
            .net
            .notary()
            .notarise(&SignedTransaction::new(tx, vec![sig]))
            .await
            .unwrap();

        let (bob, handle) = serve(&f, FlowKind::Issue, Arc::new(AcceptAll));
        bob.send(&FlowMessage::Finalized(record.clone())).await.unwrap();
        assert_eq!(
            handle.await.unwrap().unwrap(),
            ResponderOutcome::Recorded(record)
        );
        assert_eq!(f.carol_vault.transaction_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_initiator_times_out() {
        let f = fixture(FlowConfig {
            session_timeout_ms: 100,
            ..FlowConfig::default()
        });
        let (_bob, handle) = serve(&f, FlowKind::Transfer, Arc::new(AcceptAll));
        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(
            err,
            FlowError::Timeout {
                party: "O=Bob".into(),
                timeout_ms: 100
            }
        );
    }

    #[tokio::test]
    async fn finality_for_another_transaction_is_rejected() {
        let f = fixture(FlowConfig::default());
        let stx = transfer_proposal(&f, Section::Med);
        let other = transfer_proposal(&f, Section::Med);
        let (mut bob, handle) = serve(&f, FlowKind::Transfer, Arc::new(AcceptAll));

        bob.send(&FlowMessage::Proposal(stx)).await.unwrap();
        let _sig = bob.receive().await.unwrap();

        let carol_sig = sign_transaction(&other.id(), &f.carol.keypair);
        let record = f
            .net
            .notary()
            .notarise(&other.with_additional_signature(carol_sig))
            .await
            .unwrap();
        bob.send(&FlowMessage::Finalized(record)).await.unwrap();

        assert!(matches!(
            handle.await.unwrap(),
            Err(FlowError::Transaction(TransactionError::IdMismatch { .. }))
        ));
        assert_eq!(f.carol_vault.transaction_count(), 0);
    }

    /// A finalized Issue of `ticket` signed by `issuer` and stamped by
    /// `notary`, without going through any notary service.
    fn stamped_issue(
        issuer: &PartyKeys,
        notary: &PartyKeys,
        ticket: TicketState,
        kind: &str,
    ) -> FinalizedRecord {
        let tx = TransactionBuilder::new(notary.party.clone())
            .add_output(ticket)
            .raw_command(kind, [issuer.party.owning_key()])
            .build()
            .unwrap();
        let sig = sign_transaction(&tx.id, &issuer.keypair);
        let notary_signature = sign_transaction(&tx.id, &notary.keypair);
        FinalizedRecord {
            stx: SignedTransaction::new(tx, vec![sig]),
            notary_signature,
            notarised_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn record_from_an_untrusted_notary_is_not_recorded() {
        let f = fixture(FlowConfig::default());
        let mallory = PartyKeys::generate("O=Mallory");
        let rogue = PartyKeys::generate("O=Rogue Notary");
        let ticket = TicketState::new(
            mallory.party.clone(),
            f.carol.party.clone(),
            Section::High,
            AssetId::generate(),
        );
        let asset = ticket.asset_id;
        let record = stamped_issue(&mallory, &rogue, ticket, TicketCommand::Issue.wire_id());
        assert!(record.verify().is_ok());

        let (bob, handle) = serve(&f, FlowKind::Issue, Arc::new(AcceptAll));
        bob.send(&FlowMessage::Finalized(record)).await.unwrap();

        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(
            err,
            FlowError::UntrustedNotary {
                notary: "O=Rogue Notary".into()
            }
        );
        assert_eq!(err.kind(), FlowErrorKind::Protocol);
        assert_eq!(f.carol_vault.transaction_count(), 0);
        assert!(f.carol_vault.find_live(&asset).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn proposal_naming_an_untrusted_notary_is_refused() {
        let f = fixture(FlowConfig::default());
        let rogue = PartyKeys::generate("O=Rogue Notary");
        let mut stx = transfer_proposal(&f, Section::Med);
        stx.tx.notary = rogue.party.clone();
        stx.tx.inputs[0].state.notary = rogue.party.clone();
        stx.tx.id = stx.tx.compute_id();
        stx.sigs = vec![sign_transaction(&stx.tx.id, &f.bob.keypair)];

        let reason = expect_rejection(&f, FlowKind::Transfer, Arc::new(AcceptAll), stx).await;
        assert_eq!(reason, "notary O=Rogue Notary is not trusted");
    }

    #[tokio::test]
    async fn observer_reports_unknown_command_in_a_record() {
        let mut f = fixture(FlowConfig::default());
        let backup = PartyKeys::generate("O=Backup Notary");
        f.hub.notaries.push(backup.party.clone());
        let ticket = TicketState::new(
            f.venue.party.clone(),
            f.carol.party.clone(),
            Section::Med,
            AssetId::generate(),
        );
        let record = stamped_issue(&f.venue, &backup, ticket, "ticket.burn");

        let (bob, handle) = serve(&f, FlowKind::Issue, Arc::new(AcceptAll));
        bob.send(&FlowMessage::Finalized(record)).await.unwrap();

        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err, FlowError::UnknownCommand("ticket.burn".into()));
        assert_eq!(err.kind(), FlowErrorKind::Invalid);
        assert_eq!(f.carol_vault.transaction_count(), 0);
    }

    #[tokio::test]
    async fn observer_refuses_a_record_of_another_flow() {
        let f = fixture(FlowConfig::default());
        let tx = TransactionBuilder::new(f.net.notary().party().clone())
            .add_output(TicketState::new(
                f.venue.party.clone(),
                f.carol.party.clone(),
                Section::Low,
                AssetId::generate(),
            ))
            .command(TicketCommand::Issue, [f.venue.party.owning_key()])
            .build()
            .unwrap();
        let sig = sign_transaction(&tx.id, &f.venue.keypair);
        let record = f
            .net
            .notary()
            .notarise(&SignedTransaction::new(tx, vec![sig]))
            .await
            .unwrap();

        let (bob, handle) = serve(&f, FlowKind::Transfer, Arc::new(AcceptAll));
        bob.send(&FlowMessage::Finalized(record)).await.unwrap();

        assert_eq!(
            handle.await.unwrap().unwrap_err(),
            FlowError::FlowMismatch {
                expected: FlowKind::Transfer,
                got: FlowKind::Issue,
            }
        );
        assert_eq!(f.carol_vault.transaction_count(), 0);
    }

    #[tokio::test]
    async fn input_differing_from_our_live_state_is_refused() {
        let f = fixture(FlowConfig::default());
        let asset = AssetId::generate();
        let issue = TransactionBuilder::new(f.net.notary().party().clone())
            .add_output(TicketState::new(
                f.venue.party.clone(),
                f.bob.party.clone(),
                Section::Med,
                asset,
            ))
            .command(TicketCommand::Issue, [f.venue.party.owning_key()])
            .build()
            .unwrap();
        let sig = sign_transaction(&issue.id, &f.venue.keypair);
        let issued = f
            .net
            .notary()
            .notarise(&SignedTransaction::new(issue, vec![sig]))
            .await
            .unwrap();
        f.carol_vault.record(&issued).await.unwrap();

        // Bob claims the ticket he holds is a HIGH one.
        let mut input = f.carol_vault.find_live(&asset).await.unwrap().remove(0);
        input.state.data.section = Section::High.value();
        let output = input.ticket().with_new_holder(f.carol.party.clone());
        let reference = input.reference;
        let tx = TransactionBuilder::new(f.net.notary().party().clone())
            .add_input(input)
            .add_output(output)
            .command(
                TicketCommand::Transfer,
                [f.bob.party.owning_key(), f.carol.party.owning_key()],
            )
            .build()
            .unwrap();
        let sig = sign_transaction(&tx.id, &f.bob.keypair);

        let reason = expect_rejection(
            &f,
            FlowKind::Transfer,
            Arc::new(AcceptAll),
            SignedTransaction::new(tx, vec![sig]),
        )
        .await;
        assert_eq!(reason, format!("input {reference} does not match our live state"));
    }
}
