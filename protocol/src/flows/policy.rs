//! Admission policies: a party's own conditions for counter-signing.
//!
//! These sit on top of the contract. A transaction can be perfectly valid
//! ledger-wide and still be refused by a counterparty that, say, only
//! buys MED tickets. A failed check becomes a `Rejected { reason }` reply
//! and the initiator aborts with
//! [`FlowError::CounterpartySignatureRejected`](super::FlowError).

use std::fmt;
use std::sync::Arc;

use crate::ledger::FlowKind;
use crate::state::Section;
use crate::transaction::WireTransaction;

/// A party-local condition on transactions it is asked to sign.
pub trait AdmissionPolicy: Send + Sync {
    /// `Err(reason)` to refuse.
    fn check(&self, tx: &WireTransaction) -> Result<(), String>;
}

impl<F> AdmissionPolicy for F
where
    F: Fn(&WireTransaction) -> Result<(), String> + Send + Sync,
{
    fn check(&self, tx: &WireTransaction) -> Result<(), String> {
        self(tx)
    }
}

/// Signs anything the contract accepts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl AdmissionPolicy for AcceptAll {
    fn check(&self, _tx: &WireTransaction) -> Result<(), String> {
        Ok(())
    }
}

/// Only signs transactions whose produced tickets are all of one section.
/// Transactions without outputs pass.
#[derive(Debug, Clone, Copy)]
pub struct RequireSection(pub Section);

impl AdmissionPolicy for RequireSection {
    fn check(&self, tx: &WireTransaction) -> Result<(), String> {
        let wanted = self.0.value();
        if tx.outputs.iter().all(|o| o.section == wanted) {
            Ok(())
        } else {
            Err(format!("only tickets of section {} are accepted", wanted))
        }
    }
}

/// One policy per flow kind.
#[derive(Clone)]
pub struct AdmissionPolicies {
    pub issue: Arc<dyn AdmissionPolicy>,
    pub transfer: Arc<dyn AdmissionPolicy>,
    pub retire: Arc<dyn AdmissionPolicy>,
}

impl Default for AdmissionPolicies {
    /// Accept issuances and retirements; accept transfers of MED tickets.
    fn default() -> Self {
        Self {
            issue: Arc::new(AcceptAll),
            transfer: Arc::new(RequireSection(Section::Med)),
            retire: Arc::new(AcceptAll),
        }
    }
}

impl AdmissionPolicies {
    /// Accept everything the contract accepts.
    pub fn permissive() -> Self {
        Self {
            issue: Arc::new(AcceptAll),
            transfer: Arc::new(AcceptAll),
            retire: Arc::new(AcceptAll),
        }
    }

    pub fn with_issue(mut self, policy: impl AdmissionPolicy + 'static) -> Self {
        self.issue = Arc::new(policy);
        self
    }

    pub fn with_transfer(mut self, policy: impl AdmissionPolicy + 'static) -> Self {
        self.transfer = Arc::new(policy);
        self
    }

    pub fn with_retire(mut self, policy: impl AdmissionPolicy + 'static) -> Self {
        self.retire = Arc::new(policy);
        self
    }

    /// The policy applied to sessions of `kind`.
    pub fn for_kind(&self, kind: FlowKind) -> Arc<dyn AdmissionPolicy> {
        match kind {
            FlowKind::Issue => Arc::clone(&self.issue),
            FlowKind::Transfer => Arc::clone(&self.transfer),
            FlowKind::Retire => Arc::clone(&self.retire),
        }
    }
}

impl fmt::Debug for AdmissionPolicies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionPolicies").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::TicketCommand;
    use crate::identity::PartyKeys;
    use crate::state::{AssetId, TicketState};
    use crate::transaction::TransactionBuilder;

    fn issue_of(section: Section) -> WireTransaction {
        let notary = PartyKeys::generate("O=Notary").party;
        let issuer = PartyKeys::generate("O=Venue").party;
        let holder = PartyKeys::generate("O=Fan").party;
        TransactionBuilder::new(notary)
            .add_output(TicketState::new(issuer.clone(), holder, section, AssetId::generate()))
            .command(TicketCommand::Issue, [issuer.owning_key()])
            .build()
            .unwrap()
    }

    #[test]
    fn require_section_accepts_only_that_tier() {
        let policy = RequireSection(Section::Med);
        assert!(policy.check(&issue_of(Section::Med)).is_ok());
        assert_eq!(
            policy.check(&issue_of(Section::High)).unwrap_err(),
            "only tickets of section 30 are accepted"
        );
    }

    #[test]
    fn closures_are_policies() {
        let policies = AdmissionPolicies::permissive().with_issue(|tx: &WireTransaction| {
            if tx.outputs[0].section > 20 {
                Err("too expensive".to_string())
            } else {
                Ok(())
            }
        });
        let policy = policies.for_kind(FlowKind::Issue);
        assert!(policy.check(&issue_of(Section::Low)).is_ok());
        assert_eq!(policy.check(&issue_of(Section::High)).unwrap_err(), "too expensive");
    }

    #[test]
    fn defaults_restrict_transfers_only() {
        let policies = AdmissionPolicies::default();
        let high = issue_of(Section::High);
        assert!(policies.for_kind(FlowKind::Issue).check(&high).is_ok());
        assert!(policies.for_kind(FlowKind::Retire).check(&high).is_ok());
        assert!(policies.for_kind(FlowKind::Transfer).check(&high).is_err());
    }
}
