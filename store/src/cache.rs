//! View/modifier access to a shared block storage.

use crate::error::StoreError;
use crate::storage::BlockStorage;
use ember_model::{Block, BlockElement};
use ember_types::Height;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Wraps a storage backend behind a reader/writer split: any number of
/// concurrent read views, one write modifier.
pub struct BlockStorageCache {
    storage: RwLock<Box<dyn BlockStorage>>,
}

impl BlockStorageCache {
    pub fn new(storage: Box<dyn BlockStorage>) -> Self {
        Self {
            storage: RwLock::new(storage),
        }
    }

    /// Open a read-only view.
    pub fn view(&self) -> BlockStorageView<'_> {
        BlockStorageView {
            guard: self.storage.read().expect("block storage lock poisoned"),
        }
    }

    /// Open the write modifier, blocking until outstanding views close.
    pub fn modifier(&self) -> BlockStorageModifier<'_> {
        BlockStorageModifier {
            guard: self.storage.write().expect("block storage lock poisoned"),
        }
    }
}

/// Read-only access to the storage.
pub struct BlockStorageView<'a> {
    guard: RwLockReadGuard<'a, Box<dyn BlockStorage>>,
}

impl BlockStorageView<'_> {
    pub fn chain_height(&self) -> Result<Height, StoreError> {
        self.guard.chain_height()
    }

    pub fn load_block(&self, height: Height) -> Result<Block, StoreError> {
        self.guard.load_block(height)
    }

    pub fn load_block_element(&self, height: Height) -> Result<BlockElement, StoreError> {
        self.guard.load_block_element(height)
    }
}

/// Exclusive write access to the storage.
pub struct BlockStorageModifier<'a> {
    guard: RwLockWriteGuard<'a, Box<dyn BlockStorage>>,
}

impl BlockStorageModifier<'_> {
    pub fn chain_height(&self) -> Result<Height, StoreError> {
        self.guard.chain_height()
    }

    pub fn load_block_element(&self, height: Height) -> Result<BlockElement, StoreError> {
        self.guard.load_block_element(height)
    }

    pub fn save_block(&mut self, element: BlockElement) -> Result<(), StoreError> {
        self.guard.save_block(element)
    }

    pub fn drop_blocks_after(&mut self, height: Height) -> Result<(), StoreError> {
        self.guard.drop_blocks_after(height)
    }
}
