//! Block model.

use crate::transaction::{Transaction, TransactionElement};
use ember_types::{Difficulty, Hash256, Height, NetworkId, PublicKey, Signature, Timestamp};
use serde::{Deserialize, Serialize};

/// The current block entity version.
pub const BLOCK_VERSION: u8 = 1;

/// A block as seen by the sync core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub version: u8,
    pub network: NetworkId,
    /// The harvester that produced the block.
    pub signer_public_key: PublicKey,
    /// The account credited with a share of the block's fees.
    pub beneficiary_public_key: PublicKey,
    pub height: Height,
    pub timestamp: Timestamp,
    pub difficulty: Difficulty,
    /// Fee charged per transaction byte in this block.
    pub fee_multiplier: u32,
    pub signature: Signature,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// The byte range covered by the block signature: every header field
    /// past the verifiable-entity prelude (signature + signer) and before
    /// the transaction footer.
    pub fn signed_data(&self) -> Vec<u8> {
        #[derive(Serialize)]
        struct SignedFields<'a> {
            version: u8,
            network: &'a NetworkId,
            beneficiary_public_key: &'a PublicKey,
            height: &'a Height,
            timestamp: &'a Timestamp,
            difficulty: &'a Difficulty,
            fee_multiplier: u32,
        }

        // header encoding is infallible for plain field structs
        bincode::serialize(&SignedFields {
            version: self.version,
            network: &self.network,
            beneficiary_public_key: &self.beneficiary_public_key,
            height: &self.height,
            timestamp: &self.timestamp,
            difficulty: &self.difficulty,
            fee_multiplier: self.fee_multiplier,
        })
        .unwrap_or_default()
    }
}

/// A block bundled with its hashes and per-transaction elements — the unit
/// the consumer takes as input and the storage persists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockElement {
    pub block: Block,
    pub entity_hash: Hash256,
    /// Derived during processing; the processor rewrites this in place.
    pub generation_hash: Hash256,
    pub transactions: Vec<TransactionElement>,
}

impl BlockElement {
    /// Wrap a block, pairing each transaction with a zero hash. Callers that
    /// know the real transaction hashes fill them in afterwards.
    pub fn new(block: Block, entity_hash: Hash256) -> Self {
        let transactions = block
            .transactions
            .iter()
            .cloned()
            .map(|transaction| TransactionElement::new(transaction, Hash256::ZERO))
            .collect();

        Self {
            block,
            entity_hash,
            generation_hash: Hash256::ZERO,
            transactions,
        }
    }

    pub fn height(&self) -> Height {
        self.block.height
    }

    /// Hashes of all transactions in the block, in block order.
    pub fn transaction_hashes(&self) -> impl Iterator<Item = Hash256> + '_ {
        self.transactions.iter().map(|element| element.entity_hash)
    }
}
