//! Per-node vault of live and consumed ticket states.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

use super::error::LedgerError;
use crate::state::{AssetId, StateAndRef, StateRef, TxId};
use crate::transaction::FinalizedRecord;

/// A node's view of the ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Live (unconsumed) states of `asset_id`. Under correct operation this
    /// holds at most one entry.
    async fn find_live(&self, asset_id: &AssetId) -> Result<Vec<StateAndRef>, LedgerError>;

    /// Apply a finalized transaction: its inputs become consumed, its
    /// outputs become live. Recording the same transaction twice is a no-op.
    async fn record(&self, record: &FinalizedRecord) -> Result<(), LedgerError>;
}

#[derive(Default)]
struct VaultInner {
    live: HashMap<StateRef, StateAndRef>,
    consumed: HashSet<StateRef>,
    transactions: HashMap<TxId, FinalizedRecord>,
}

/// In-memory [`LedgerStore`].
///
/// Records may arrive out of order (a node can learn of a transfer before
/// the issuance it spends); an output that some recorded transaction has
/// already consumed is never made live.
#[derive(Default)]
pub struct InMemoryLedger {
    inner: RwLock<VaultInner>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A previously recorded transaction.
    pub fn transaction(&self, id: &TxId) -> Option<FinalizedRecord> {
        self.inner.read().transactions.get(id).cloned()
    }

    /// Number of recorded transactions.
    pub fn transaction_count(&self) -> usize {
        self.inner.read().transactions.len()
    }

    /// Every live state, in no particular order.
    pub fn live_states(&self) -> Vec<StateAndRef> {
        self.inner.read().live.values().cloned().collect()
    }

    /// `true` if `state_ref` has been consumed by a recorded transaction.
    pub fn is_consumed(&self, state_ref: &StateRef) -> bool {
        self.inner.read().consumed.contains(state_ref)
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn find_live(&self, asset_id: &AssetId) -> Result<Vec<StateAndRef>, LedgerError> {
        let inner = self.inner.read();
        let mut found: Vec<StateAndRef> = inner
            .live
            .values()
            .filter(|s| s.ticket().asset_id == *asset_id)
            .cloned()
            .collect();
        found.sort_by_key(|s| s.reference);
        Ok(found)
    }

    async fn record(&self, record: &FinalizedRecord) -> Result<(), LedgerError> {
        let id = record.id();
        if !record.stx.tx.id_matches() {
            return Err(LedgerError::InvalidRecord(id));
        }

        let mut inner = self.inner.write();
        if inner.transactions.contains_key(&id) {
            trace!(tx_id = %id, "transaction already recorded");
            return Ok(());
        }

        for input in record.consumed() {
            inner.live.remove(&input);
            inner.consumed.insert(input);
        }
        for output in record.produced() {
            if !inner.consumed.contains(&output.reference) {
                inner.live.insert(output.reference, output);
            }
        }
        inner.transactions.insert(id, record.clone());

        debug!(
            tx_id = %id,
            command = %record.stx.tx.command.kind,
            live = inner.live.len(),
            "transaction recorded"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
