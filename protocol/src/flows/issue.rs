//! Issue: we create a ticket and hand it to a holder.
//!
//! Only the issuer signs, so no signing session is opened. The holder
//! learns of the ticket through the finality broadcast.

use async_trait::async_trait;

use super::error::FlowError;
use super::hub::ServiceHub;
use super::proposal::{propose_issue, Proposal};
use super::saga::InitiatingFlow;
use crate::identity::Party;

#[derive(Debug, Clone)]
pub struct IssueFlow {
    pub holder: Party,
    /// Raw tier value; the contract decides whether it is admissible.
    pub section: u32,
}

impl IssueFlow {
    pub fn new(holder: Party, section: impl Into<u32>) -> Self {
        Self {
            holder,
            section: section.into(),
        }
    }
}

#[async_trait]
impl InitiatingFlow for IssueFlow {
    async fn propose(&self, hub: &ServiceHub) -> Result<Proposal, FlowError> {
        propose_issue(hub, self.holder.clone(), self.section)
    }
}
