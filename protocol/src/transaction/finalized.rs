//! Notarised transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::signing::{SignedTransaction, TransactionSignature};
use super::verification::{verify_signed_transaction, TransactionError};
use crate::state::{StateAndRef, StateRef, TxId};

/// A fully signed transaction plus the notary's signature over its id.
///
/// This is what every participant records. Once it exists, the inputs are
/// consumed for good and the outputs are live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedRecord {
    pub stx: SignedTransaction,
    pub notary_signature: TransactionSignature,
    pub notarised_at: DateTime<Utc>,
}

/// Why a finalized record cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FinalityError {
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error("notary signature is not by the transaction notary")]
    WrongNotary,

    #[error("notary signature does not verify")]
    InvalidNotarySignature,
}

impl FinalizedRecord {
    pub fn id(&self) -> TxId {
        self.stx.id()
    }

    /// States consumed by this transaction.
    pub fn consumed(&self) -> Vec<StateRef> {
        self.stx.tx.input_refs()
    }

    /// States produced by this transaction.
    pub fn produced(&self) -> Vec<StateAndRef> {
        self.stx.tx.output_states()
    }

    /// Full check: id, contract, every declared signer, and a valid
    /// signature by the notary named on the transaction.
    pub fn verify(&self) -> Result<(), FinalityError> {
        verify_signed_transaction(&self.stx)?;
        if self.notary_signature.by != self.stx.tx.notary.owning_key() {
            return Err(FinalityError::WrongNotary);
        }
        if !self.notary_signature.verify(&self.id()) {
            return Err(FinalityError::InvalidNotarySignature);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::TicketCommand;
    use crate::identity::PartyKeys;
    use crate::state::{AssetId, Section, TicketState};
    use crate::transaction::{sign_transaction, TransactionBuilder};

    fn record(notary: &PartyKeys, signer_of_record: &PartyKeys) -> FinalizedRecord {
        let issuer = PartyKeys::generate("O=Venue");
        let holder = PartyKeys::generate("O=Fan").party;
        let tx = TransactionBuilder::new(notary.party.clone())
            .add_output(TicketState::new(
                issuer.party.clone(),
                holder,
                Section::High,
                AssetId::generate(),
            ))
            .command(TicketCommand::Issue, [issuer.party.owning_key()])
            .build()
            .unwrap();
        let id = tx.id;
        FinalizedRecord {
            stx: SignedTransaction::new(tx, vec![sign_transaction(&id, &issuer.keypair)]),
            notary_signature: sign_transaction(&id, &signer_of_record.keypair),
            notarised_at: Utc::now(),
        }
    }

    #[test]
    fn notary_signed_record_verifies() {
        let notary = PartyKeys::generate("O=Notary");
        let rec = record(&notary, &notary);
        assert!(rec.verify().is_ok());
        assert!(rec.consumed().is_empty());
        assert_eq!(rec.produced()[0].reference, StateRef::new(rec.id(), 0));
    }

    #[test]
    fn record_signed_by_someone_else_is_rejected() {
        let notary = PartyKeys::generate("O=Notary");
        let impostor = PartyKeys::generate("O=Impostor");
        let rec = record(&notary, &impostor);
        assert_eq!(rec.verify().unwrap_err(), FinalityError::WrongNotary);
    }

    #[test]
    fn forged_notary_signature_is_rejected() {
        let notary = PartyKeys::generate("O=Notary");
        let mut rec = record(&notary, &notary);
        rec.notary_signature.signature = notary.keypair.sign(b"something else");
        assert_eq!(
            rec.verify().unwrap_err(),
            FinalityError::InvalidNotarySignature
        );
    }
}
