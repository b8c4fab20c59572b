//! The ticket state and its price tiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::{SECTION_HIGH, SECTION_LOW, SECTION_MED};
use crate::identity::Party;

// ---------------------------------------------------------------------------
// AssetId
// ---------------------------------------------------------------------------

/// Identifier shared by every version of one ticket. Assigned once, at
/// issuance, and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(Uuid);

impl AssetId {
    /// A fresh random (v4) identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// Admissible price tiers. The discriminant is the tier value carried on
/// the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Section {
    Low = SECTION_LOW,
    Med = SECTION_MED,
    High = SECTION_HIGH,
}

impl Section {
    /// Every admissible tier, cheapest first.
    pub const ALL: [Section; 3] = [Section::Low, Section::Med, Section::High];

    /// The ledger value of this tier.
    pub fn value(self) -> u32 {
        self as u32
    }

    /// Map a raw ledger value to a tier. `None` for anything outside
    /// {15, 30, 50}.
    pub fn from_value(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.value() == value)
    }
}

impl From<Section> for u32 {
    fn from(section: Section) -> Self {
        section.value()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Med => write!(f, "MED"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

// ---------------------------------------------------------------------------
// TicketState
// ---------------------------------------------------------------------------

/// One version of a ticket.
///
/// `section` is kept as the raw tier value rather than a [`Section`] so
/// that a proposal carrying an inadmissible tier can be built, inspected
/// and rejected by the contract instead of being unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketState {
    /// The party that originated the ticket. Conserved for its lifetime.
    pub issuer: Party,
    /// The current owner (the "spectator").
    pub holder: Party,
    /// Price tier value.
    pub section: u32,
    /// Identifier shared by all versions.
    pub asset_id: AssetId,
}

impl TicketState {
    pub fn new(issuer: Party, holder: Party, section: impl Into<u32>, asset_id: AssetId) -> Self {
        Self {
            issuer,
            holder,
            section: section.into(),
            asset_id,
        }
    }

    /// Parties that must learn about every transaction touching this state:
    /// the issuer and the current holder.
    pub fn participants(&self) -> Vec<Party> {
        vec![self.issuer.clone(), self.holder.clone()]
    }

    /// The admissible tier, if the raw value is one.
    pub fn section_tier(&self) -> Option<Section> {
        Section::from_value(self.section)
    }

    /// The next version of this ticket, owned by `new_holder`. Issuer,
    /// section and asset id carry over unchanged.
    pub fn with_new_holder(&self, new_holder: Party) -> Self {
        Self {
            issuer: self.issuer.clone(),
            holder: new_holder,
            section: self.section,
            asset_id: self.asset_id,
        }
    }

    /// Bytes fed into the transaction id. Field order is fixed.
    pub(crate) fn canonical_bytes(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.issuer.name().as_bytes());
        buf.push(0x00);
        buf.extend_from_slice(self.issuer.owning_key().as_bytes());
        buf.extend_from_slice(self.holder.name().as_bytes());
        buf.push(0x00);
        buf.extend_from_slice(self.holder.owning_key().as_bytes());
        buf.extend_from_slice(&self.section.to_le_bytes());
        buf.extend_from_slice(self.asset_id.as_uuid().as_bytes());
    }
}

impl fmt::Display for TicketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ticket{{issuer={}, holder={}, section={}, asset={}}}",
            self.issuer, self.holder, self.section, self.asset_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PartyKeys;

    #[test]
    fn section_values_match_tiers() {
        assert_eq!(Section::Low.value(), 15);
        assert_eq!(Section::Med.value(), 30);
        assert_eq!(Section::High.value(), 50);
        assert_eq!(Section::from_value(30), Some(Section::Med));
        assert_eq!(Section::from_value(20), None);
        assert_eq!(Section::from_value(0), None);
    }

    #[test]
    fn new_holder_conserves_everything_else() {
        let a = PartyKeys::generate("O=Alice").party;
        let b = PartyKeys::generate("O=Bob").party;
        let c = PartyKeys::generate("O=Carol").party;
        let id = AssetId::generate();

        let v1 = TicketState::new(a.clone(), b, Section::Med, id);
        let v2 = v1.with_new_holder(c.clone());

        assert_eq!(v2.issuer, a);
        assert_eq!(v2.holder, c);
        assert_eq!(v2.section, 30);
        assert_eq!(v2.asset_id, id);
        assert_eq!(v2.section_tier(), Some(Section::Med));
    }

    #[test]
    fn participants_are_issuer_then_holder() {
        let a = PartyKeys::generate("O=Alice").party;
        let b = PartyKeys::generate("O=Bob").party;
        let t = TicketState::new(a.clone(), b.clone(), 15u32, AssetId::generate());
        assert_eq!(t.participants(), vec![a, b]);
    }

    #[test]
    fn canonical_bytes_change_with_holder() {
        let a = PartyKeys::generate("O=Alice").party;
        let b = PartyKeys::generate("O=Bob").party;
        let c = PartyKeys::generate("O=Carol").party;
        let t = TicketState::new(a, b, Section::High, AssetId::generate());

        let mut before = Vec::new();
        t.canonical_bytes(&mut before);
        let mut after = Vec::new();
        t.with_new_holder(c).canonical_bytes(&mut after);
        assert_ne!(before, after);
    }
}
