//! # Signing Sagas
//!
//! Multi-party workflows that take a ticket transition from intent to a
//! notarised, recorded transaction.
//!
//! ```text
//! proposal.rs  — intent → WireTransaction + signer/observer sets
//! saga.rs      — SigningSaga: verify, sign, collect, finalize (initiator)
//! issue.rs     — IssueFlow
//! transfer.rs  — TransferFlow
//! retire.rs    — RetireFlow
//! responder.rs — counterparty: vet, sign, await finality, record
//! policy.rs    — party-local admission policies
//! progress.rs  — SagaState machine published on a watch channel
//! hub.rs       — ServiceHub: the collaborators a saga runs against
//! node.rs      — TicketNode: initiator API + inbound session dispatcher
//! local.rs     — LocalNetwork: in-process wiring of nodes and a notary
//! error.rs     — FlowError, FlowErrorKind
//! ```
//!
//! ## Message sequence (Transfer, B → C, issuer A)
//!
//! ```text
//! B                      C                      Notary         A
//! │── Proposal(stx) ────►│                        │            │
//! │◄──── Signature ──────│                        │            │
//! │── notarise ──────────┼───────────────────────►│            │
//! │◄──────── FinalizedRecord ─────────────────────│            │
//! │── Finalized ────────►│                        │            │
//! │── Finalized ─────────┼────────────────────────┼───────────►│
//! ```

pub mod error;
pub mod hub;
pub mod issue;
pub mod local;
pub mod node;
pub mod policy;
pub mod progress;
pub mod proposal;
pub mod responder;
pub mod retire;
pub mod saga;
pub mod transfer;

pub use error::{FlowError, FlowErrorKind};
pub use hub::ServiceHub;
pub use issue::IssueFlow;
pub use local::{LocalNetwork, LocalNode};
pub use node::{ResponderEvent, SagaHandle, TicketNode};
pub use policy::{AcceptAll, AdmissionPolicies, AdmissionPolicy, RequireSection};
pub use progress::{SagaProgress, SagaState};
pub use proposal::Proposal;
pub use responder::ResponderOutcome;
pub use retire::RetireFlow;
pub use saga::{InitiatingFlow, SigningSaga};
pub use transfer::TransferFlow;
