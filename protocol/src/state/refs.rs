//! Ledger addressing: which transaction output produced which state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::TX_ID_LENGTH;
use crate::identity::Party;

use super::ticket::TicketState;

/// Transaction id: double SHA-256 of the transaction's canonical bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxId([u8; TX_ID_LENGTH]);

impl TxId {
    pub fn from_bytes(bytes: [u8; TX_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TX_ID_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", &self.to_hex()[..16])
    }
}

/// Pointer to output `index` of transaction `tx_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateRef {
    pub tx_id: TxId,
    pub index: u32,
}

impl StateRef {
    pub fn new(tx_id: TxId, index: u32) -> Self {
        Self { tx_id, index }
    }
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.tx_id, self.index)
    }
}

/// A ticket state bound to the notary that sequences its consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionState {
    pub data: TicketState,
    pub notary: Party,
}

/// A state together with the output slot that produced it. This is what
/// the ledger store hands out and what a transaction consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateAndRef {
    pub state: TransactionState,
    pub reference: StateRef,
}

impl StateAndRef {
    /// Shorthand for the ticket data.
    pub fn ticket(&self) -> &TicketState {
        &self.state.data
    }
}
