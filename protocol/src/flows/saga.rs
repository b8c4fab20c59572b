//! The initiator side of every ticket transition.
//!
//! A [`SigningSaga`] drives one [`InitiatingFlow`] through
//! propose → verify → sign → collect → finalize. Each step is published on
//! the saga's [`SagaProgress`]. Any error aborts the saga; nothing is
//! written anywhere until the notary has committed the transaction, so an
//! aborted or dropped saga leaves no trace on the ledger.

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::error::FlowError;
use super::hub::ServiceHub;
use super::progress::{SagaProgress, SagaState};
use super::proposal::Proposal;
use crate::identity::Party;
use crate::ledger::{FlowKind, FlowMessage, Session};
use crate::state::TxId;
use crate::transaction::{
    verify_transaction, FinalizedRecord, SignedTransaction, TransactionSignature,
};

/// Something a saga can run: knows how to build its proposal.
#[async_trait]
pub trait InitiatingFlow: Send + Sync {
    async fn propose(&self, hub: &ServiceHub) -> Result<Proposal, FlowError>;
}

/// One run of an initiating flow on behalf of the hub's identity.
pub struct SigningSaga {
    hub: ServiceHub,
    progress: SagaProgress,
}

impl SigningSaga {
    pub fn new(hub: ServiceHub) -> Self {
        Self {
            hub,
            progress: SagaProgress::new(),
        }
    }

    /// Follow the saga's state.
    pub fn progress(&self) -> watch::Receiver<SagaState> {
        self.progress.subscribe()
    }

    /// Run `flow` to completion.
    pub async fn run<F: InitiatingFlow>(self, flow: F) -> Result<FinalizedRecord, FlowError> {
        match self.execute(&flow).await {
            Ok(record) => Ok(record),
            Err(e) => {
                self.progress.abort();
                warn!(party = %self.hub.identity, error = %e, kind = ?e.kind(), "saga aborted");
                Err(e)
            }
        }
    }

    async fn execute(&self, flow: &dyn InitiatingFlow) -> Result<FinalizedRecord, FlowError> {
        let proposal = flow.propose(&self.hub).await?;
        let tx_id = proposal.tx.id;
        let kind = FlowKind::from(proposal.command);
        let us = self.hub.identity.clone();

        // Step 1: our own contract check. No session is opened before this.
        verify_transaction(&proposal.tx)?;
        if !proposal.required_signers.contains(&us.owning_key()) {
            return Err(FlowError::ValidationFailure(format!(
                "initiator must be a required signer of a {}",
                proposal.command
            )));
        }
        self.progress.advance(SagaState::LocallyVerified)?;

        // Step 2: sign.
        let our_sig = self.hub.signer.sign(&tx_id, &us.owning_key()).await?;
        let mut stx = SignedTransaction::new(proposal.tx.clone(), vec![our_sig]);
        self.progress.advance(SagaState::LocallySigned)?;
        debug!(tx_id = %tx_id, flow = %kind, "signed locally");

        // Step 3: collect counter-signatures.
        let mut sessions = Vec::with_capacity(proposal.counterparties.len());
        if !proposal.counterparties.is_empty() {
            for party in &proposal.counterparties {
                let session = self.open(party, kind).await?;
                session
                    .send(&FlowMessage::Proposal(stx.clone()))
                    .await
                    .map_err(|e| FlowError::from_session(e, party.name()))?;
                sessions.push(session);
            }

            let timeout = self.hub.config.session_timeout();
            for session in sessions.iter_mut() {
                let sig = collect_signature(session, &tx_id, timeout).await?;
                stx = stx.with_additional_signature(sig);
            }
            self.progress.advance(SagaState::CounterSigned)?;
            debug!(tx_id = %tx_id, signers = stx.sigs.len(), "counter-signatures collected");
        }

        // Step 4: notarise, record, broadcast.
        stx.verify_required_signatures()?;
        let record = self.hub.notary.notarise(&stx).await?;
        self.hub.ledger.record(&record).await?;

        for observer in &proposal.observers {
            match self.open(observer, kind).await {
                Ok(session) => sessions.push(session),
                Err(e) => warn!(tx_id = %tx_id, observer = %observer, error = %e, "observer unreachable"),
            }
        }
        broadcast_finality(&sessions, &record).await;

        self.progress.advance(SagaState::Finalized)?;
        info!(
            tx_id = %tx_id,
            flow = %kind,
            party = %us,
            audience = sessions.len(),
            "saga finalized"
        );
        Ok(record)
    }

    async fn open(&self, party: &Party, kind: FlowKind) -> Result<Session, FlowError> {
        self.hub
            .messaging
            .open(&self.hub.identity, party, kind)
            .await
            .map_err(|e| FlowError::from_session(e, party.name()))
    }
}

/// Wait for one counterparty's answer to a proposal.
async fn collect_signature(
    session: &mut Session,
    tx_id: &TxId,
    timeout: Duration,
) -> Result<TransactionSignature, FlowError> {
    let party = session.counterparty().clone();
    let reply = session
        .receive_within(timeout)
        .await
        .map_err(|e| FlowError::from_session(e, party.name()))?;

    match reply {
        FlowMessage::Signature(sig) => {
            if sig.by != party.owning_key() || !sig.verify(tx_id) {
                return Err(FlowError::InvalidSignature { by: sig.by });
            }
            Ok(sig)
        }
        FlowMessage::Rejected { reason } => {
            info!(tx_id = %tx_id, party = %party, reason = %reason, "counterparty refused to sign");
            Err(FlowError::CounterpartySignatureRejected {
                party: party.name().to_string(),
                reason,
            })
        }
        other => Err(FlowError::UnexpectedMessage {
            expected: "signature",
            got: other.label(),
        }),
    }
}

/// Send the finalized record down every session. Delivery failures are
/// logged: the transaction is already committed and recorded by us.
async fn broadcast_finality(sessions: &[Session], record: &FinalizedRecord) {
    let message = FlowMessage::Finalized(record.clone());
    let sends = sessions.iter().map(|s| s.send(&message));
    let results = join_all(sends).await;

    let mut delivered = BTreeSet::new();
    for (session, result) in sessions.iter().zip(results) {
        match result {
            Ok(()) => {
                delivered.insert(session.counterparty().name().to_string());
            }
            Err(e) => warn!(
                tx_id = %record.id(),
                party = %session.counterparty(),
                error = %e,
                "finality broadcast not delivered"
            ),
        }
    }
    debug!(tx_id = %record.id(), delivered = ?delivered, "finality broadcast");
}
