//! Transaction model.

use ember_types::{Amount, Hash256, Height, NetworkId, PublicKey, Signature, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of the fixed transaction header on the wire, in bytes.
pub const TRANSACTION_HEADER_SIZE: u32 = 128;

/// Discriminates transaction kinds; each registered plugin owns one value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityType(u16);

impl EntityType {
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// A transaction as seen by the sync core: header fields plus an opaque
/// type-specific payload interpreted by the registered plugin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub entity_type: EntityType,
    pub version: u8,
    pub network: NetworkId,
    pub signer_public_key: PublicKey,
    pub max_fee: Amount,
    pub deadline: Timestamp,
    pub signature: Signature,
    pub payload: Vec<u8>,
}

impl Transaction {
    /// Total wire size: the fixed header plus the type-specific payload.
    pub fn size(&self) -> u32 {
        TRANSACTION_HEADER_SIZE + self.payload.len() as u32
    }
}

/// A transaction tagged with its entity hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionElement {
    pub transaction: Transaction,
    pub entity_hash: Hash256,
}

impl TransactionElement {
    pub fn new(transaction: Transaction, entity_hash: Hash256) -> Self {
        Self {
            transaction,
            entity_hash,
        }
    }
}

/// A confirmed transaction together with its provenance, used when
/// reporting transactions that left the confirmed set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionInfo {
    pub transaction: Transaction,
    pub entity_hash: Hash256,
    pub height: Height,
}
