//! The block storage trait.

use crate::error::StoreError;
use ember_model::{Block, BlockElement};
use ember_types::Height;

/// Height-indexed block storage, crash-consistent at block granularity.
///
/// An initialized store always holds at least the nemesis block, so
/// `chain_height` is never zero.
pub trait BlockStorage: Send + Sync {
    /// The height of the highest stored block.
    fn chain_height(&self) -> Result<Height, StoreError>;

    /// Load the block stored at `height`.
    fn load_block(&self, height: Height) -> Result<Block, StoreError>;

    /// Load the block element (block plus hashes) stored at `height`.
    fn load_block_element(&self, height: Height) -> Result<BlockElement, StoreError>;

    /// Append a block element at height `chain_height() + 1`.
    fn save_block(&mut self, element: BlockElement) -> Result<(), StoreError>;

    /// Remove every block above `height`. `height` must be at least 1; the
    /// nemesis block can never be dropped.
    fn drop_blocks_after(&mut self, height: Height) -> Result<(), StoreError>;
}
