//! Everything-in-one-process wiring: one notary, one session network and
//! any number of nodes, each with its own vault and keys.
//!
//! Used by the test suites and handy for demos and embedding.

use std::ops::Deref;
use std::sync::Arc;

use super::error::FlowError;
use super::hub::ServiceHub;
use super::node::TicketNode;
use super::policy::AdmissionPolicies;
use crate::config::FlowConfig;
use crate::identity::PartyKeys;
use crate::ledger::{InMemoryLedger, InMemoryNetwork, InMemoryNotary, LocalSigner};

/// A notary and a session network shared by all nodes created from it.
pub struct LocalNetwork {
    network: Arc<InMemoryNetwork>,
    notary: Arc<InMemoryNotary>,
    config: FlowConfig,
}

/// A started node plus direct access to its vault.
pub struct LocalNode {
    pub node: TicketNode,
    pub vault: Arc<InMemoryLedger>,
}

impl Deref for LocalNode {
    type Target = TicketNode;

    fn deref(&self) -> &TicketNode {
        &self.node
    }
}

impl Default for LocalNetwork {
    fn default() -> Self {
        Self::new(FlowConfig::default())
    }
}

impl LocalNetwork {
    pub fn new(config: FlowConfig) -> Self {
        Self {
            network: Arc::new(InMemoryNetwork::new(config.inbox_capacity)),
            notary: Arc::new(InMemoryNotary::new(PartyKeys::generate("O=Notary"))),
            config,
        }
    }

    pub fn notary(&self) -> &Arc<InMemoryNotary> {
        &self.notary
    }

    pub fn network(&self) -> &Arc<InMemoryNetwork> {
        &self.network
    }

    /// Build the services for `keys` without starting a node.
    pub fn hub_for(&self, keys: &PartyKeys, vault: Arc<InMemoryLedger>) -> ServiceHub {
        ServiceHub {
            identity: keys.party.clone(),
            ledger: vault,
            signer: Arc::new(LocalSigner::new([keys.keypair.clone()])),
            notary: self.notary.clone(),
            messaging: self.network.clone(),
            notaries: vec![self.notary.party().clone()],
            config: self.config.clone(),
        }
    }

    /// Create a party called `name`, wire it up and start answering sessions.
    pub async fn start_node(
        &self,
        name: &str,
        policies: AdmissionPolicies,
    ) -> Result<LocalNode, FlowError> {
        let keys = PartyKeys::generate(name);
        let vault = Arc::new(InMemoryLedger::new());
        let node = TicketNode::new(self.hub_for(&keys, vault.clone()), policies);
        node.start().await?;
        Ok(LocalNode { node, vault })
    }
}
