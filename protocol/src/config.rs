//! # Protocol Configuration & Constants
//!
//! Every tunable number of the ticket protocol lives here. The constants
//! define the wire vocabulary that all parties must agree on; [`FlowConfig`]
//! holds the per-node knobs that may differ between deployments.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Major version. Bump on changes to the transaction canonical bytes or to
/// the contract rules, since parties on different majors disagree on
/// validity.
pub const PROTOCOL_VERSION_MAJOR: u16 = 0;

/// Minor version. Bump on backward-compatible additions.
pub const PROTOCOL_VERSION_MINOR: u16 = 1;

/// Patch version.
pub const PROTOCOL_VERSION_PATCH: u16 = 0;

/// The full version string.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Version stamped into every transaction's canonical bytes.
pub const TRANSACTION_VERSION: u16 = 1;

// ---------------------------------------------------------------------------
// Ticket Contract Vocabulary
// ---------------------------------------------------------------------------

/// Wire identifier of the issuance command.
pub const COMMAND_ISSUE: &str = "ticket.issue";

/// Wire identifier of the transfer command.
pub const COMMAND_TRANSFER: &str = "ticket.transfer";

/// Wire identifier of the retirement command.
pub const COMMAND_RETIRE: &str = "ticket.retire";

/// Price tier value of a LOW section ticket.
pub const SECTION_LOW: u32 = 15;

/// Price tier value of a MED section ticket.
pub const SECTION_MED: u32 = 30;

/// Price tier value of a HIGH section ticket.
pub const SECTION_HIGH: u32 = 50;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Ed25519 public key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Ed25519 signature length in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Transaction id length in bytes (double SHA-256 output).
pub const TX_ID_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Timing Constants
// ---------------------------------------------------------------------------

/// How long a saga waits on a single session receive before giving up.
/// Covers one counterparty round-trip including its local validation.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30);

/// How long a responder waits for the finalized broadcast after it has
/// counter-signed. Longer than the session timeout because the initiator
/// may still be collecting other signatures and waiting on the notary.
pub const DEFAULT_FINALITY_TIMEOUT: Duration = Duration::from_secs(120);

/// Bound of each party's inbound session queue on the in-memory network.
pub const DEFAULT_INBOX_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// FlowConfig
// ---------------------------------------------------------------------------

/// Per-node tunables for the signing sagas and their responders.
///
/// Deserializable so that an embedding host can load it from whatever
/// configuration format it already uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Milliseconds a saga waits for a counterparty response.
    pub session_timeout_ms: u64,

    /// Milliseconds a responder waits for the finalized record.
    pub finality_timeout_ms: u64,

    /// Capacity of the inbound session queue.
    pub inbox_capacity: usize,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            session_timeout_ms: DEFAULT_SESSION_TIMEOUT.as_millis() as u64,
            finality_timeout_ms: DEFAULT_FINALITY_TIMEOUT.as_millis() as u64,
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
        }
    }
}

impl FlowConfig {
    /// Session receive timeout as a [`Duration`].
    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }

    /// Finality receive timeout as a [`Duration`].
    pub fn finality_timeout(&self) -> Duration {
        Duration::from_millis(self.finality_timeout_ms)
    }
}
