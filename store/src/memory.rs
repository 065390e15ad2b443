//! In-memory block storage for tests and tooling.

use crate::error::StoreError;
use crate::storage::BlockStorage;
use ember_model::{Block, BlockElement, BLOCK_VERSION};
use ember_types::{Difficulty, Hash256, Height, NetworkId, PublicKey, Signature, Timestamp};
use std::collections::BTreeMap;

/// Build the deterministic nemesis block element for `network`.
pub fn nemesis_element(network: NetworkId) -> BlockElement {
    let block = Block {
        version: BLOCK_VERSION,
        network,
        signer_public_key: PublicKey::ZERO,
        beneficiary_public_key: PublicKey::ZERO,
        height: Height::ONE,
        timestamp: Timestamp::EPOCH,
        difficulty: Difficulty::BASE,
        fee_multiplier: 0,
        signature: Signature::ZERO,
        transactions: Vec::new(),
    };

    let mut entity_hash = [0u8; 32];
    entity_hash[0] = network.byte();
    BlockElement::new(block, Hash256::new(entity_hash))
}

/// Block storage backed by a height-keyed map, pre-seeded with the nemesis.
pub struct MemoryBlockStorage {
    elements: BTreeMap<Height, BlockElement>,
}

impl MemoryBlockStorage {
    pub fn new(network: NetworkId) -> Self {
        let mut elements = BTreeMap::new();
        elements.insert(Height::ONE, nemesis_element(network));
        Self { elements }
    }
}

impl BlockStorage for MemoryBlockStorage {
    fn chain_height(&self) -> Result<Height, StoreError> {
        Ok(self
            .elements
            .keys()
            .next_back()
            .copied()
            .unwrap_or(Height::ZERO))
    }

    fn load_block(&self, height: Height) -> Result<Block, StoreError> {
        self.load_block_element(height).map(|element| element.block)
    }

    fn load_block_element(&self, height: Height) -> Result<BlockElement, StoreError> {
        self.elements
            .get(&height)
            .cloned()
            .ok_or(StoreError::NotFound(height))
    }

    fn save_block(&mut self, element: BlockElement) -> Result<(), StoreError> {
        let chain_height = self.chain_height()?;
        if element.height() != chain_height + 1 {
            return Err(StoreError::HeightGap {
                chain_height,
                requested: element.height(),
            });
        }

        self.elements.insert(element.height(), element);
        Ok(())
    }

    fn drop_blocks_after(&mut self, height: Height) -> Result<(), StoreError> {
        if height < Height::ONE {
            return Err(StoreError::NemesisImmutable(height));
        }

        self.elements = {
            let mut kept = std::mem::take(&mut self.elements);
            kept.split_off(&(height + 1));
            kept
        };
        Ok(())
    }
}
