//! Retire: destroy a live ticket. Issuer and holder must both sign; the
//! one that did not initiate is the counterparty.

use async_trait::async_trait;

use super::error::FlowError;
use super::hub::ServiceHub;
use super::proposal::{propose_retire, Proposal};
use super::saga::InitiatingFlow;
use crate::state::AssetId;

#[derive(Debug, Clone, Copy)]
pub struct RetireFlow {
    pub asset_id: AssetId,
}

impl RetireFlow {
    pub fn new(asset_id: AssetId) -> Self {
        Self { asset_id }
    }
}

#[async_trait]
impl InitiatingFlow for RetireFlow {
    async fn propose(&self, hub: &ServiceHub) -> Result<Proposal, FlowError> {
        propose_retire(hub, self.asset_id).await
    }
}
