//! LMDB implementation of BlockStorage.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use ember_model::{Block, BlockElement};
use ember_store::{nemesis_element, BlockStorage, StoreError};
use ember_types::{Height, NetworkId};

use crate::LmdbError;

const CHAIN_HEIGHT_KEY: &[u8] = b"chain_height";

fn height_key(height: Height) -> [u8; 8] {
    height.raw().to_be_bytes()
}

pub struct LmdbBlockStorage {
    env: Arc<Env>,
    blocks_db: Database<Bytes, Bytes>,
    meta_db: Database<Bytes, Bytes>,
}

impl LmdbBlockStorage {
    /// Open the block storage, seeding the nemesis block for `network` when
    /// the database is empty.
    pub fn new(
        env: Arc<Env>,
        blocks_db: Database<Bytes, Bytes>,
        meta_db: Database<Bytes, Bytes>,
        network: NetworkId,
    ) -> Result<Self, LmdbError> {
        let storage = Self {
            env,
            blocks_db,
            meta_db,
        };

        let initialized = {
            let rtxn = storage.env.read_txn()?;
            storage.meta_db.get(&rtxn, CHAIN_HEIGHT_KEY)?.is_some()
        };

        if !initialized {
            let nemesis = nemesis_element(network);
            let bytes = bincode::serialize(&nemesis)
                .map_err(|e| LmdbError::Serialization(e.to_string()))?;

            let mut wtxn = storage.env.write_txn()?;
            storage
                .blocks_db
                .put(&mut wtxn, &height_key(Height::ONE), &bytes)?;
            storage.meta_db.put(
                &mut wtxn,
                CHAIN_HEIGHT_KEY,
                &Height::ONE.raw().to_be_bytes(),
            )?;
            wtxn.commit()?;
            tracing::debug!("seeded nemesis block into empty block storage");
        }

        Ok(storage)
    }

    fn read_chain_height(&self, raw: Option<&[u8]>) -> Result<Height, LmdbError> {
        match raw {
            Some(bytes) if bytes.len() == 8 => {
                let arr: [u8; 8] = bytes
                    .try_into()
                    .map_err(|_| LmdbError::Serialization("chain height".into()))?;
                Ok(Height::new(u64::from_be_bytes(arr)))
            }
            Some(_) => Err(LmdbError::Serialization(
                "chain_height has unexpected byte length".to_string(),
            )),
            None => Err(LmdbError::NotFound("chain_height".to_string())),
        }
    }
}

impl BlockStorage for LmdbBlockStorage {
    fn chain_height(&self) -> Result<Height, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let raw = self
            .meta_db
            .get(&rtxn, CHAIN_HEIGHT_KEY)
            .map_err(LmdbError::from)?;
        Ok(self.read_chain_height(raw)?)
    }

    fn load_block(&self, height: Height) -> Result<Block, StoreError> {
        self.load_block_element(height).map(|element| element.block)
    }

    fn load_block_element(&self, height: Height) -> Result<BlockElement, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .blocks_db
            .get(&rtxn, &height_key(height))
            .map_err(LmdbError::from)?
            .ok_or(StoreError::NotFound(height))?;
        bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn save_block(&mut self, element: BlockElement) -> Result<(), StoreError> {
        let bytes = bincode::serialize(&element)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let chain_height = {
            let raw = self
                .meta_db
                .get(&wtxn, CHAIN_HEIGHT_KEY)
                .map_err(LmdbError::from)?;
            self.read_chain_height(raw)?
        };
        if element.height() != chain_height + 1 {
            return Err(StoreError::HeightGap {
                chain_height,
                requested: element.height(),
            });
        }

        self.blocks_db
            .put(&mut wtxn, &height_key(element.height()), &bytes)
            .map_err(LmdbError::from)?;
        self.meta_db
            .put(
                &mut wtxn,
                CHAIN_HEIGHT_KEY,
                &element.height().raw().to_be_bytes(),
            )
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn drop_blocks_after(&mut self, height: Height) -> Result<(), StoreError> {
        if height < Height::ONE {
            return Err(StoreError::NemesisImmutable(height));
        }

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let chain_height = {
            let raw = self
                .meta_db
                .get(&wtxn, CHAIN_HEIGHT_KEY)
                .map_err(LmdbError::from)?;
            self.read_chain_height(raw)?
        };

        let mut dropped = 0u64;
        let mut cursor = height + 1;
        while cursor <= chain_height {
            self.blocks_db
                .delete(&mut wtxn, &height_key(cursor))
                .map_err(LmdbError::from)?;
            dropped += 1;
            cursor = cursor + 1;
        }

        if dropped > 0 {
            self.meta_db
                .put(&mut wtxn, CHAIN_HEIGHT_KEY, &height.raw().to_be_bytes())
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;

        if dropped > 0 {
            tracing::debug!(%height, dropped, "dropped blocks above height");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::LmdbEnvironment;
    use ember_model::BLOCK_VERSION;
    use ember_types::{Difficulty, Hash256, PublicKey, Signature, Timestamp};

    fn temp_storage() -> (tempfile::TempDir, LmdbBlockStorage) {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).expect("open env");
        let storage = env.block_storage(NetworkId::Dev).expect("open storage");
        (dir, storage)
    }

    fn element(height: u64) -> BlockElement {
        let block = Block {
            version: BLOCK_VERSION,
            network: NetworkId::Dev,
            signer_public_key: PublicKey::new([height as u8; 32]),
            beneficiary_public_key: PublicKey::ZERO,
            height: Height::new(height),
            timestamp: Timestamp::new(height * 1000),
            difficulty: Difficulty::BASE,
            fee_multiplier: 0,
            signature: Signature::ZERO,
            transactions: Vec::new(),
        };
        BlockElement::new(block, Hash256::new([height as u8; 32]))
    }

    #[test]
    fn fresh_storage_is_seeded_with_nemesis() {
        let (_dir, storage) = temp_storage();
        assert_eq!(Ok(Height::ONE), storage.chain_height());
        assert_eq!(Height::ONE, storage.load_block(Height::ONE).unwrap().height);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (_dir, mut storage) = temp_storage();
        storage.save_block(element(2)).unwrap();
        storage.save_block(element(3)).unwrap();

        assert_eq!(Ok(Height::new(3)), storage.chain_height());
        let loaded = storage.load_block_element(Height::new(3)).unwrap();
        assert_eq!(element(3), loaded);
    }

    #[test]
    fn save_with_gap_is_rejected() {
        let (_dir, mut storage) = temp_storage();
        let err = storage.save_block(element(5)).unwrap_err();
        assert_eq!(
            StoreError::HeightGap {
                chain_height: Height::ONE,
                requested: Height::new(5),
            },
            err
        );
        assert_eq!(Ok(Height::ONE), storage.chain_height());
    }

    #[test]
    fn drop_blocks_after_truncates_and_allows_reappend() {
        let (_dir, mut storage) = temp_storage();
        for height in 2..=6 {
            storage.save_block(element(height)).unwrap();
        }

        storage.drop_blocks_after(Height::new(3)).unwrap();

        assert_eq!(Ok(Height::new(3)), storage.chain_height());
        assert_eq!(
            Err(StoreError::NotFound(Height::new(4))),
            storage.load_block(Height::new(4))
        );
        storage.save_block(element(4)).unwrap();
        assert_eq!(Ok(Height::new(4)), storage.chain_height());
    }

    #[test]
    fn contents_survive_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        {
            let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
            let mut storage = env.block_storage(NetworkId::Dev).unwrap();
            storage.save_block(element(2)).unwrap();
        }

        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        let storage = env.block_storage(NetworkId::Dev).unwrap();
        assert_eq!(Ok(Height::new(2)), storage.chain_height());
        assert_eq!(element(2), storage.load_block_element(Height::new(2)).unwrap());
    }
}
