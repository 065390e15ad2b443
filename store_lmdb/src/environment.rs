//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::block::LmdbBlockStorage;
use crate::LmdbError;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,

    /// Serialized block elements keyed by big-endian height.
    pub(crate) blocks_db: Database<Bytes, Bytes>,
    /// Storage metadata (chain height).
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)
            .map_err(|e| LmdbError::Heed(format!("failed to create directory: {e}")))?;

        let env = unsafe {
            EnvOpenOptions::new()
                .max_dbs(2)
                .map_size(map_size)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let blocks_db = env.create_database(&mut wtxn, Some("blocks"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        Ok(Self {
            env: Arc::new(env),
            blocks_db,
            meta_db,
        })
    }

    /// Get a shared reference to the underlying heed environment.
    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    /// Create a block storage backed by this environment, seeding the
    /// nemesis block when the database is empty.
    pub fn block_storage(
        &self,
        network: ember_types::NetworkId,
    ) -> Result<LmdbBlockStorage, LmdbError> {
        LmdbBlockStorage::new(Arc::clone(&self.env), self.blocks_db, self.meta_db, network)
    }
}
