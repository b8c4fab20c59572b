// Copyright (c) 2026 Ticket Ledger Contributors. MIT License.
// See LICENSE for details.

//! # Ticket Protocol — Core Library
//!
//! Non-fungible tickets on a shared, notarised ledger. A ticket is issued
//! by a venue to a holder, can change hands any number of times, and is
//! eventually retired. Every change is a transaction that all affected
//! parties validate and sign, and that a notary orders against every
//! other transaction touching the same ticket.
//!
//! ## Architecture
//!
//! - **config** — Protocol constants and per-node flow settings.
//! - **crypto** — Ed25519 keys and signatures, hashing.
//! - **identity** — Parties: names bound to owning keys.
//! - **state** — The ticket data model and ledger addressing.
//! - **contract** — The validation engine every party runs.
//! - **transaction** — Building, signing, verifying and finalizing transactions.
//! - **ledger** — Vault, signer, notary and session collaborators.
//! - **flows** — The Issue/Transfer/Retire sagas and their responders.
//! - **logging** — `tracing` subscriber setup for hosts.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use ticket_protocol::flows::{AdmissionPolicies, LocalNetwork};
//! use ticket_protocol::state::Section;
//!
//! # async fn demo() -> Result<(), ticket_protocol::flows::FlowError> {
//! let net = LocalNetwork::default();
//! let venue = net.start_node("O=Venue", AdmissionPolicies::default()).await?;
//! let bob = net.start_node("O=Bob", AdmissionPolicies::default()).await?;
//! let carol = net.start_node("O=Carol", AdmissionPolicies::default()).await?;
//!
//! let issued = venue.issue(bob.party().clone(), Section::Med).await?;
//! let asset_id = issued.stx.tx.outputs[0].asset_id;
//! bob.transfer(asset_id, carol.party().clone()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod contract;
pub mod crypto;
pub mod flows;
pub mod identity;
pub mod ledger;
pub mod logging;
pub mod state;
pub mod transaction;
