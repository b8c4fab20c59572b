//! The notarising authority: uniqueness of consumption.
//!
//! A notary sees every transaction that spends a state it controls. It
//! checks the transaction is fully signed and valid, then atomically
//! marks all inputs consumed. A second transaction spending any of those
//! inputs is refused with [`NotaryError::Conflict`]. Re-submitting an
//! already notarised transaction returns the original record.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::error::NotaryError;
use crate::identity::{Party, PartyKeys};
use crate::state::{StateRef, TxId};
use crate::transaction::{
    sign_transaction, verify_signed_transaction, FinalizedRecord, SignedTransaction,
};

/// Commits fully signed transactions.
#[async_trait]
pub trait NotaryService: Send + Sync {
    async fn notarise(&self, stx: &SignedTransaction) -> Result<FinalizedRecord, NotaryError>;
}

#[derive(Default)]
struct CommitLog {
    consumed: HashMap<StateRef, TxId>,
    committed: HashMap<TxId, FinalizedRecord>,
}

/// Single-node, in-process notary.
pub struct InMemoryNotary {
    identity: PartyKeys,
    log: Mutex<CommitLog>,
}

impl InMemoryNotary {
    pub fn new(identity: PartyKeys) -> Self {
        Self {
            identity,
            log: Mutex::new(CommitLog::default()),
        }
    }

    /// The notary's ledger identity. Transactions must name it.
    pub fn party(&self) -> &Party {
        &self.identity.party
    }

    /// The transaction that consumed `state_ref`, if any.
    pub fn consumed_by(&self, state_ref: &StateRef) -> Option<TxId> {
        self.log.lock().consumed.get(state_ref).copied()
    }

    /// Number of transactions committed.
    pub fn committed_count(&self) -> usize {
        self.log.lock().committed.len()
    }
}

#[async_trait]
impl NotaryService for InMemoryNotary {
    async fn notarise(&self, stx: &SignedTransaction) -> Result<FinalizedRecord, NotaryError> {
        let id = stx.id();
        if stx.tx.notary != self.identity.party {
            warn!(tx_id = %id, notary = %stx.tx.notary, "transaction names another notary");
            return Err(NotaryError::WrongNotary);
        }
        verify_signed_transaction(stx)?;

        let mut log = self.log.lock();
        if let Some(existing) = log.committed.get(&id) {
            debug!(tx_id = %id, "transaction already notarised");
            return Ok(existing.clone());
        }

        for input in stx.tx.input_refs() {
            if let Some(&consumed_by) = log.consumed.get(&input) {
                warn!(
                    tx_id = %id,
                    state_ref = %input,
                    consumed_by = %consumed_by,
                    "double spend refused"
                );
                return Err(NotaryError::Conflict {
                    state_ref: input,
                    consumed_by,
                });
            }
        }
        for input in stx.tx.input_refs() {
            log.consumed.insert(input, id);
        }

        let record = FinalizedRecord {
            stx: stx.clone(),
            notary_signature: sign_transaction(&id, &self.identity.keypair),
            notarised_at: Utc::now(),
        };
        log.committed.insert(id, record.clone());

        info!(
            tx_id = %id,
            command = %stx.tx.command.kind,
            inputs = stx.tx.inputs.len(),
            "transaction notarised"
        );
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::TicketCommand;
    use crate::state::{AssetId, Section, StateAndRef, TicketState};
    use crate::transaction::{TransactionBuilder, TransactionError};

    struct World {
        notary: InMemoryNotary,
        issuer: PartyKeys,
        bob: PartyKeys,
        carol: PartyKeys,
        dave: PartyKeys,
    }

    fn world() -> World {
        World {
            notary: InMemoryNotary::new(PartyKeys::generate("O=Notary")),
            issuer: PartyKeys::generate("O=Venue"),
            bob: PartyKeys::generate("O=Bob"),
            carol: PartyKeys::generate("O=Carol"),
            dave: PartyKeys::generate("O=Dave"),
        }
    }

    async fn issued(w: &World) -> StateAndRef {
        let tx = TransactionBuilder::new(w.notary.party().clone())
            .add_output(TicketState::new(
                w.issuer.party.clone(),
                w.bob.party.clone(),
                Section::Med,
                AssetId::generate(),
            ))
            .command(TicketCommand::Issue, [w.issuer.party.owning_key()])
            .build()
            .unwrap();
        let sig = sign_transaction(&tx.id, &w.issuer.keypair);
        let rec = w
            .notary
            .notarise(&SignedTransaction::new(tx, vec![sig]))
            .await
            .unwrap();
        rec.produced().remove(0)
    }

    fn transfer_to(input: &StateAndRef, from: &PartyKeys, to: &PartyKeys) -> SignedTransaction {
        let tx = TransactionBuilder::new(input.state.notary.clone())
            .add_input(input.clone())
            .add_output(input.ticket().with_new_holder(to.party.clone()))
            .command(
                TicketCommand::Transfer,
                [from.party.owning_key(), to.party.owning_key()],
            )
            .build()
            .unwrap();
        let sigs = vec![
            sign_transaction(&tx.id, &from.keypair),
            sign_transaction(&tx.id, &to.keypair),
        ];
        SignedTransaction::new(tx, sigs)
    }

    #[tokio::test]
    async fn second_spend_of_same_state_conflicts() {
        let w = world();
        let live = issued(&w).await;

        let first = transfer_to(&live, &w.bob, &w.carol);
        let second = transfer_to(&live, &w.bob, &w.dave);

        let rec = w.notary.notarise(&first).await.unwrap();
        assert!(rec.verify().is_ok());

        let err = w.notary.notarise(&second).await.unwrap_err();
        assert_eq!(
            err,
            NotaryError::Conflict {
                state_ref: live.reference,
                consumed_by: first.id()
            }
        );
        assert_eq!(w.notary.consumed_by(&live.reference), Some(first.id()));
    }

    #[tokio::test]
    async fn resubmission_is_idempotent() {
        let w = world();
        let live = issued(&w).await;
        let stx = transfer_to(&live, &w.bob, &w.carol);

        let a = w.notary.notarise(&stx).await.unwrap();
        let b = w.notary.notarise(&stx).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(w.notary.committed_count(), 2);
    }

    #[tokio::test]
    async fn partially_signed_transaction_is_refused() {
        let w = world();
        let live = issued(&w).await;
        let mut stx = transfer_to(&live, &w.bob, &w.carol);
        stx.sigs.pop();

        assert!(matches!(
            w.notary.notarise(&stx).await,
            Err(NotaryError::Invalid(TransactionError::MissingSignatures { .. }))
        ));
        assert_eq!(w.notary.consumed_by(&live.reference), None);
    }

    #[tokio::test]
    async fn foreign_notary_is_refused() {
        let w = world();
        let other = InMemoryNotary::new(PartyKeys::generate("O=OtherNotary"));
        let live = issued(&w).await;
        let stx = transfer_to(&live, &w.bob, &w.carol);
        assert_eq!(
            other.notarise(&stx).await.unwrap_err(),
            NotaryError::WrongNotary
        );
    }

    #[tokio::test]
    async fn concurrent_spends_admit_exactly_one() {
        let w = std::sync::Arc::new(world());
        let live = issued(&w).await;
        let a = transfer_to(&live, &w.bob, &w.carol);
        let b = transfer_to(&live, &w.bob, &w.dave);

        let (wa, wb) = (w.clone(), w.clone());
        let ha = tokio::spawn(async move { wa.notary.notarise(&a).await });
        let hb = tokio::spawn(async move { wb.notary.notarise(&b).await });
        let results = [ha.await.unwrap(), hb.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(NotaryError::Conflict { .. })))
                .count(),
            1
        );
    }
}
