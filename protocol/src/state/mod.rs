//! # Ledger States
//!
//! The data model of the ticket ledger:
//!
//! ```text
//! ticket.rs — TicketState, Section, AssetId
//! refs.rs   — TxId, StateRef, TransactionState, StateAndRef
//! ```
//!
//! A ticket's lifecycle is a chain of immutable [`TicketState`] versions
//! sharing one [`AssetId`]. Each version is produced by exactly one
//! transaction output slot ([`StateRef`]) and consumed by at most one later
//! transaction.

pub mod refs;
pub mod ticket;

pub use refs::{StateAndRef, StateRef, TransactionState, TxId};
pub use ticket::{AssetId, Section, TicketState};
