//! A party's node: initiates sagas and answers other parties' sessions.

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::FlowError;
use super::hub::ServiceHub;
use super::issue::IssueFlow;
use super::policy::AdmissionPolicies;
use super::progress::SagaState;
use super::responder::{respond, ResponderOutcome};
use super::retire::RetireFlow;
use super::saga::{InitiatingFlow, SigningSaga};
use super::transfer::TransferFlow;
use crate::identity::Party;
use crate::ledger::{FlowKind, SessionInit};
use crate::state::{AssetId, StateAndRef};
use crate::transaction::FinalizedRecord;

/// Capacity of the responder event channel. Slow subscribers lag rather
/// than block responders.
const EVENT_CAPACITY: usize = 64;

/// Reported once per finished responder session.
#[derive(Debug, Clone)]
pub struct ResponderEvent {
    pub flow: FlowKind,
    pub counterparty: Party,
    pub outcome: Result<ResponderOutcome, FlowError>,
}

/// A saga running in the background.
pub struct SagaHandle {
    pub progress: watch::Receiver<SagaState>,
    pub task: JoinHandle<Result<FinalizedRecord, FlowError>>,
}

/// One party on the ticket network.
pub struct TicketNode {
    hub: ServiceHub,
    policies: AdmissionPolicies,
    events: broadcast::Sender<ResponderEvent>,
    shutdown: watch::Sender<bool>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl TicketNode {
    pub fn new(hub: ServiceHub, policies: AdmissionPolicies) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (shutdown, _) = watch::channel(false);
        Self {
            hub,
            policies,
            events,
            shutdown,
            dispatcher: Mutex::new(None),
        }
    }

    pub fn party(&self) -> &Party {
        &self.hub.identity
    }

    pub fn hub(&self) -> &ServiceHub {
        &self.hub
    }

    /// Register on the network and start answering inbound sessions.
    pub async fn start(&self) -> Result<(), FlowError> {
        let inbox = self.hub.messaging.register(&self.hub.identity).await?;
        let handle = tokio::spawn(dispatch(
            self.hub.clone(),
            self.policies.clone(),
            inbox,
            self.events.clone(),
            self.shutdown.subscribe(),
        ));
        if let Some(previous) = self.dispatcher.lock().replace(handle) {
            previous.abort();
        }
        info!(party = %self.hub.identity, "ticket node started");
        Ok(())
    }

    /// Stop accepting sessions. Responders already running finish on
    /// their own.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Outcomes of responder sessions served from now on.
    pub fn subscribe_responses(&self) -> broadcast::Receiver<ResponderEvent> {
        self.events.subscribe()
    }

    /// Issue a new ticket held by `holder`.
    pub async fn issue(
        &self,
        holder: Party,
        section: impl Into<u32>,
    ) -> Result<FinalizedRecord, FlowError> {
        SigningSaga::new(self.hub.clone())
            .run(IssueFlow::new(holder, section))
            .await
    }

    /// Transfer the live ticket `asset_id` to `new_holder`.
    pub async fn transfer(
        &self,
        asset_id: AssetId,
        new_holder: Party,
    ) -> Result<FinalizedRecord, FlowError> {
        SigningSaga::new(self.hub.clone())
            .run(TransferFlow::new(asset_id, new_holder))
            .await
    }

    /// Retire the live ticket `asset_id`.
    pub async fn retire(&self, asset_id: AssetId) -> Result<FinalizedRecord, FlowError> {
        SigningSaga::new(self.hub.clone())
            .run(RetireFlow::new(asset_id))
            .await
    }

    /// Run any initiating flow as a background task with progress tracking.
    pub fn spawn<F>(&self, flow: F) -> SagaHandle
    where
        F: InitiatingFlow + 'static,
    {
        let saga = SigningSaga::new(self.hub.clone());
        let progress = saga.progress();
        let task = tokio::spawn(saga.run(flow));
        SagaHandle { progress, task }
    }

    /// The live version of `asset_id` in our ledger, if any.
    pub async fn live_state(&self, asset_id: &AssetId) -> Result<Option<StateAndRef>, FlowError> {
        let mut live = self.hub.ledger.find_live(asset_id).await?;
        match live.len() {
            0 => Ok(None),
            1 => Ok(live.pop()),
            n => Err(FlowError::LedgerContractViolation {
                asset_id: *asset_id,
                live: n,
            }),
        }
    }
}

impl Drop for TicketNode {
    fn drop(&mut self) {
        if let Some(handle) = self.dispatcher.lock().take() {
            handle.abort();
        }
    }
}

/// Accept inbound sessions until shutdown, one responder task each.
async fn dispatch(
    hub: ServiceHub,
    policies: AdmissionPolicies,
    mut inbox: mpsc::Receiver<SessionInit>,
    events: broadcast::Sender<ResponderEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            init = inbox.recv() => {
                let Some(init) = init else {
                    debug!(party = %hub.identity, "inbox closed");
                    return;
                };
                let hub = hub.clone();
                let policy = policies.for_kind(init.flow);
                let events = events.clone();
                tokio::spawn(async move {
                    let flow = init.flow;
                    let counterparty = init.session.counterparty().clone();
                    let outcome = respond(&hub, policy.as_ref(), init).await;
                    if let Err(e) = &outcome {
                        warn!(party = %hub.identity, from = %counterparty, flow = %flow, error = %e, "responder failed");
                    }
                    // No subscribers is fine.
                    let _ = events.send(ResponderEvent { flow, counterparty, outcome });
                });
            }
            _ = shutdown.changed() => {
                info!(party = %hub.identity, "ticket node shutting down");
                return;
            }
        }
    }
}
