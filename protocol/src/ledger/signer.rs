//! Key management: signs transaction ids with locally held keys.

use async_trait::async_trait;
use std::collections::HashMap;

use super::error::SigningError;
use crate::crypto::keys::{KeyPair, PublicKey};
use crate::state::TxId;
use crate::transaction::{sign_transaction, TransactionSignature};

/// Produces signatures for the node's own keys.
#[async_trait]
pub trait SigningService: Send + Sync {
    async fn sign(&self, tx_id: &TxId, key: &PublicKey)
        -> Result<TransactionSignature, SigningError>;
}

/// A [`SigningService`] over keypairs held in process memory.
pub struct LocalSigner {
    keys: HashMap<PublicKey, KeyPair>,
}

impl LocalSigner {
    pub fn new(keys: impl IntoIterator<Item = KeyPair>) -> Self {
        Self {
            keys: keys.into_iter().map(|k| (k.public_key(), k)).collect(),
        }
    }

    /// `true` if this signer can sign for `key`.
    pub fn holds(&self, key: &PublicKey) -> bool {
        self.keys.contains_key(key)
    }
}

#[async_trait]
impl SigningService for LocalSigner {
    async fn sign(
        &self,
        tx_id: &TxId,
        key: &PublicKey,
    ) -> Result<TransactionSignature, SigningError> {
        let keypair = self.keys.get(key).ok_or(SigningError::UnknownKey(*key))?;
        Ok(sign_transaction(tx_id, keypair))
    }
}
