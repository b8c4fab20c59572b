//! # Transaction Module
//!
//! Construction, signing, verification and finality of ticket
//! transactions.
//!
//! ## Architecture
//!
//! ```text
//! builder.rs      — WireTransaction, CommandData, TransactionBuilder
//! signing.rs      — TransactionSignature, SignedTransaction
//! verification.rs — id, notary and contract checks; TransactionError
//! finalized.rs    — FinalizedRecord: a notarised SignedTransaction
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: assemble inputs, outputs and the command with
//!    [`TransactionBuilder`]; the id is fixed at this point.
//! 2. **Verify**: every party runs [`verify_transaction`].
//! 3. **Sign**: each required signer adds a [`TransactionSignature`] over
//!    the id.
//! 4. **Notarise**: the notary checks signatures and input uniqueness and
//!    countersigns, producing a [`FinalizedRecord`].
//!
//! Transaction ids are `double_sha256` of the canonical byte encoding, so
//! every party derives the same id without trusting the sender's.

pub mod builder;
pub mod finalized;
pub mod signing;
pub mod verification;

pub use builder::{CommandData, TransactionBuilder, WireTransaction};
pub use finalized::{FinalityError, FinalizedRecord};
pub use signing::{sign_transaction, SignedTransaction, TransactionSignature};
pub use verification::{verify_signed_transaction, verify_transaction, TransactionError};
