//! The services available to a saga running on one node.

use std::sync::Arc;

use super::error::FlowError;
use crate::config::FlowConfig;
use crate::crypto::keys::PublicKey;
use crate::identity::Party;
use crate::ledger::{LedgerStore, Messaging, NotaryService, SigningService};

/// Everything a saga or responder needs from its host node.
///
/// Cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct ServiceHub {
    /// The party this node acts as.
    pub identity: Party,
    pub ledger: Arc<dyn LedgerStore>,
    pub signer: Arc<dyn SigningService>,
    pub notary: Arc<dyn NotaryService>,
    pub messaging: Arc<dyn Messaging>,
    /// Notaries from the network map, preferred first.
    pub notaries: Vec<Party>,
    pub config: FlowConfig,
}

impl ServiceHub {
    /// Our owning key.
    pub fn our_key(&self) -> PublicKey {
        self.identity.owning_key()
    }

    /// Whether `notary` is on our network map.
    pub fn trusts_notary(&self, notary: &Party) -> bool {
        self.notaries.contains(notary)
    }

    /// The notary new tickets are assigned to.
    pub fn default_notary(&self) -> Result<&Party, FlowError> {
        self.notaries.first().ok_or(FlowError::NoNotaryAvailable)
    }
}
