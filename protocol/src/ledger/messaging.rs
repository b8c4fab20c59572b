//! Point-to-point sessions between parties.
//!
//! A [`Session`] is a bidirectional, ordered channel between two parties,
//! scoped to one saga. Messages cross it as JSON bytes so that every
//! exchange goes through the same encode/decode path a networked transport
//! would. [`InMemoryNetwork`] wires sessions between nodes in one process.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use super::error::SessionError;
use crate::config::DEFAULT_INBOX_CAPACITY;
use crate::contract::TicketCommand;
use crate::crypto::keys::PublicKey;
use crate::identity::Party;
use crate::transaction::{FinalizedRecord, SignedTransaction, TransactionSignature};

/// Messages buffered per direction of one session.
const SESSION_BUFFER: usize = 16;

// ---------------------------------------------------------------------------
// Wire messages
// ---------------------------------------------------------------------------

/// Which saga opened a session. The receiving node uses it to pick the
/// responder's admission policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowKind {
    Issue,
    Transfer,
    Retire,
}

impl From<TicketCommand> for FlowKind {
    fn from(cmd: TicketCommand) -> Self {
        match cmd {
            TicketCommand::Issue => Self::Issue,
            TicketCommand::Transfer => Self::Transfer,
            TicketCommand::Retire => Self::Retire,
        }
    }
}

impl FlowKind {
    /// The command this flow proposes.
    pub fn command(self) -> TicketCommand {
        match self {
            Self::Issue => TicketCommand::Issue,
            Self::Transfer => TicketCommand::Transfer,
            Self::Retire => TicketCommand::Retire,
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command())
    }
}

/// Everything a saga and a responder say to each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum FlowMessage {
    /// Initiator → counterparty: please validate and sign.
    Proposal(SignedTransaction),
    /// Counterparty → initiator: my signature over the id.
    Signature(TransactionSignature),
    /// Counterparty → initiator: I will not sign, and why.
    Rejected { reason: String },
    /// Initiator → everyone involved: the notarised transaction.
    Finalized(FinalizedRecord),
}

impl FlowMessage {
    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Proposal(_) => "proposal",
            Self::Signature(_) => "signature",
            Self::Rejected { .. } => "rejected",
            Self::Finalized(_) => "finalized",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, SessionError> {
        serde_json::to_vec(self).map_err(|e| SessionError::Codec(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SessionError> {
        serde_json::from_slice(bytes).map_err(|e| SessionError::Codec(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One end of a two-party session.
pub struct Session {
    id: Uuid,
    counterparty: Party,
    outbound: mpsc::Sender<Vec<u8>>,
    inbound: mpsc::Receiver<Vec<u8>>,
}

impl Session {
    /// A connected pair: the first end talks to `b`, the second to `a`.
    pub fn pair(a: Party, b: Party) -> (Session, Session) {
        let id = Uuid::new_v4();
        let (a_tx, b_rx) = mpsc::channel(SESSION_BUFFER);
        let (b_tx, a_rx) = mpsc::channel(SESSION_BUFFER);
        (
            Session {
                id,
                counterparty: b,
                outbound: a_tx,
                inbound: a_rx,
            },
            Session {
                id,
                counterparty: a,
                outbound: b_tx,
                inbound: b_rx,
            },
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The party on the other end.
    pub fn counterparty(&self) -> &Party {
        &self.counterparty
    }

    pub async fn send(&self, message: &FlowMessage) -> Result<(), SessionError> {
        let bytes = message.encode()?;
        trace!(session = %self.id, to = %self.counterparty, kind = message.label(), "send");
        self.outbound
            .send(bytes)
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Suspend until the next message arrives.
    pub async fn receive(&mut self) -> Result<FlowMessage, SessionError> {
        let bytes = self.inbound.recv().await.ok_or(SessionError::Closed)?;
        let message = FlowMessage::decode(&bytes)?;
        trace!(session = %self.id, from = %self.counterparty, kind = message.label(), "receive");
        Ok(message)
    }

    /// [`Session::receive`] bounded by `timeout`.
    pub async fn receive_within(&mut self, timeout: Duration) -> Result<FlowMessage, SessionError> {
        match tokio::time::timeout(timeout, self.receive()).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("counterparty", &self.counterparty)
            .finish()
    }
}

/// Delivered to a node when someone opens a session with it.
#[derive(Debug)]
pub struct SessionInit {
    pub flow: FlowKind,
    pub session: Session,
}

// ---------------------------------------------------------------------------
// Messaging
// ---------------------------------------------------------------------------

/// The session layer.
#[async_trait]
pub trait Messaging: Send + Sync {
    /// Register `party` and return the queue of sessions others open with it.
    async fn register(&self, party: &Party) -> Result<mpsc::Receiver<SessionInit>, SessionError>;

    /// Open a session from `from` to `to` for a saga of kind `flow`.
    async fn open(&self, from: &Party, to: &Party, flow: FlowKind)
        -> Result<Session, SessionError>;
}

/// Routes sessions between parties registered in the same process.
pub struct InMemoryNetwork {
    inboxes: DashMap<PublicKey, mpsc::Sender<SessionInit>>,
    inbox_capacity: usize,
}

impl Default for InMemoryNetwork {
    fn default() -> Self {
        Self::new(DEFAULT_INBOX_CAPACITY)
    }
}

impl InMemoryNetwork {
    /// A network whose inboxes queue up to `inbox_capacity` sessions.
    /// A capacity of zero is raised to one.
    pub fn new(inbox_capacity: usize) -> Self {
        if inbox_capacity == 0 {
            warn!("inbox capacity 0 is unusable, using 1");
        }
        Self {
            inboxes: DashMap::new(),
            inbox_capacity: inbox_capacity.max(1),
        }
    }

    /// Take `party` off the network. Later `open` calls to it fail.
    pub fn unregister(&self, party: &Party) {
        self.inboxes.remove(&party.owning_key());
    }

    pub fn is_registered(&self, party: &Party) -> bool {
        self.inboxes.contains_key(&party.owning_key())
    }
}

#[async_trait]
impl Messaging for InMemoryNetwork {
    async fn register(&self, party: &Party) -> Result<mpsc::Receiver<SessionInit>, SessionError> {
        let key = party.owning_key();
        if self
            .inboxes
            .get(&key)
            .is_some_and(|existing| !existing.is_closed())
        {
            return Err(SessionError::AlreadyRegistered(party.name().to_string()));
        }
        let (tx, rx) = mpsc::channel(self.inbox_capacity);
        self.inboxes.insert(key, tx);
        debug!(party = %party, "registered on network");
        Ok(rx)
    }

    async fn open(
        &self,
        from: &Party,
        to: &Party,
        flow: FlowKind,
    ) -> Result<Session, SessionError> {
        // Clone the sender out so no map guard is held across the await.
        let inbox = self
            .inboxes
            .get(&to.owning_key())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SessionError::UnknownParty(to.name().to_string()))?;

        let (ours, theirs) = Session::pair(from.clone(), to.clone());
        debug!(session = %ours.id(), from = %from, to = %to, flow = %flow, "session opened");
        inbox
            .send(SessionInit {
                flow,
                session: theirs,
            })
            .await
            .map_err(|_| SessionError::UnknownParty(to.name().to_string()))?;
        Ok(ours)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
