//! # Ledger Collaborators
//!
//! The services a signing saga depends on but does not implement, each
//! behind an `async_trait` so that a node can be wired to real
//! infrastructure or to the in-process versions provided here.
//!
//! ```text
//! store.rs     — LedgerStore: live-state lookup and recording (InMemoryLedger)
//! signer.rs    — SigningService: key management (LocalSigner)
//! notary.rs    — NotaryService: uniqueness of consumption (InMemoryNotary)
//! messaging.rs — Messaging/Session: JSON sessions between parties (InMemoryNetwork)
//! error.rs     — LedgerError, NotaryError, SessionError, SigningError
//! ```

pub mod error;
pub mod messaging;
pub mod notary;
pub mod signer;
pub mod store;

pub use error::{LedgerError, NotaryError, SessionError, SigningError};
pub use messaging::{FlowKind, FlowMessage, InMemoryNetwork, Messaging, Session, SessionInit};
pub use notary::{InMemoryNotary, NotaryService};
pub use signer::{LocalSigner, SigningService};
pub use store::{InMemoryLedger, LedgerStore};
