//! Transfer: move a live ticket to a new holder.
//!
//! Either the current or the new holder may initiate; the other one is
//! the single counterparty. The issuer is not asked to sign but receives
//! the finalized record.

use async_trait::async_trait;

use super::error::FlowError;
use super::hub::ServiceHub;
use super::proposal::{propose_transfer, Proposal};
use super::saga::InitiatingFlow;
use crate::identity::Party;
use crate::state::AssetId;

#[derive(Debug, Clone)]
pub struct TransferFlow {
    pub asset_id: AssetId,
    pub new_holder: Party,
}

impl TransferFlow {
    pub fn new(asset_id: AssetId, new_holder: Party) -> Self {
        Self {
            asset_id,
            new_holder,
        }
    }
}

#[async_trait]
impl InitiatingFlow for TransferFlow {
    async fn propose(&self, hub: &ServiceHub) -> Result<Proposal, FlowError> {
        propose_transfer(hub, self.asset_id, self.new_holder.clone()).await
    }
}
