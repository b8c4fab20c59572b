//! # Identity Module
//!
//! A ledger participant is a [`Party`]: a well-known name bound to the
//! Ed25519 key that signs on its behalf. Parties are compared by both name
//! and key, so two nodes reusing a name with different keys are distinct.

pub mod party;

pub use party::{Party, PartyKeys};
