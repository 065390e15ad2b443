//! Sliding-window cache of per-block difficulty infos.

use crate::error::CacheError;
use ember_types::{Difficulty, Height, Timestamp};
use std::collections::BTreeMap;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard};

/// The difficulty data retained per stored block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockDifficultyInfo {
    pub height: Height,
    pub timestamp: Timestamp,
    pub difficulty: Difficulty,
}

impl BlockDifficultyInfo {
    pub fn new(height: Height, timestamp: Timestamp, difficulty: Difficulty) -> Self {
        Self {
            height,
            timestamp,
            difficulty,
        }
    }
}

/// Height-keyed window of difficulty infos for every stored block up to the
/// chain tip, consumed by the difficulty checker.
///
/// Follows the account-state cache's view/delta shape: many concurrent
/// views, at most one open delta.
pub struct BlockDifficultyCache {
    infos: RwLock<BTreeMap<Height, BlockDifficultyInfo>>,
    delta_open: AtomicBool,
}

impl Default for BlockDifficultyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDifficultyCache {
    pub fn new() -> Self {
        Self {
            infos: RwLock::new(BTreeMap::new()),
            delta_open: AtomicBool::new(false),
        }
    }

    fn infos_read(&self) -> RwLockReadGuard<'_, BTreeMap<Height, BlockDifficultyInfo>> {
        self.infos.read().expect("block difficulty cache lock poisoned")
    }

    pub fn view(&self) -> BlockDifficultyCacheView<'_> {
        BlockDifficultyCacheView {
            guard: self.infos_read(),
        }
    }

    pub fn delta(&self) -> Result<BlockDifficultyCacheDelta<'_>, CacheError> {
        if self
            .delta_open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CacheError::DeltaAlreadyOpen);
        }

        let working = self.infos_read().clone();
        Ok(BlockDifficultyCacheDelta {
            cache: self,
            working,
        })
    }
}

/// A read-only snapshot view.
pub struct BlockDifficultyCacheView<'a> {
    guard: RwLockReadGuard<'a, BTreeMap<Height, BlockDifficultyInfo>>,
}

impl BlockDifficultyCacheView<'_> {
    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }

    pub fn contains(&self, height: Height) -> bool {
        self.guard.contains_key(&height)
    }

    pub fn get(&self, height: Height) -> Option<BlockDifficultyInfo> {
        self.guard.get(&height).copied()
    }

    /// The most recent `count` infos ending at `height`, oldest first —
    /// the window a difficulty checker consumes.
    pub fn infos_ending_at(&self, height: Height, count: usize) -> Vec<BlockDifficultyInfo> {
        let mut infos: Vec<_> = self
            .guard
            .range(..=height)
            .rev()
            .take(count)
            .map(|(_, info)| *info)
            .collect();
        infos.reverse();
        infos
    }
}

/// The cache's single write delta, working on a snapshot of the window.
pub struct BlockDifficultyCacheDelta<'a> {
    cache: &'a BlockDifficultyCache,
    working: BTreeMap<Height, BlockDifficultyInfo>,
}

impl BlockDifficultyCacheDelta<'_> {
    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    pub fn contains(&self, height: Height) -> bool {
        self.working.contains_key(&height)
    }

    pub fn get(&self, height: Height) -> Option<BlockDifficultyInfo> {
        self.working.get(&height).copied()
    }

    fn tip(&self) -> Option<Height> {
        self.working.keys().next_back().copied()
    }

    /// Insert the info for the next block. The window must stay contiguous:
    /// inserting anything but tip + 1 (or any height into an empty window)
    /// indicates observer-ordering corruption.
    pub fn insert(&mut self, info: BlockDifficultyInfo) -> Result<(), CacheError> {
        if let Some(tip) = self.tip() {
            if info.height != tip + 1 {
                return Err(CacheError::NonContiguousDifficulty {
                    expected: tip + 1,
                    actual: info.height,
                });
            }
        }

        self.working.insert(info.height, info);
        Ok(())
    }

    /// Remove the info at `height`, which must be the current tip — infos
    /// are only removed while unwinding blocks from the top.
    pub fn remove(&mut self, height: Height) -> Result<(), CacheError> {
        match self.tip() {
            Some(tip) if tip == height => {
                self.working.remove(&height);
                Ok(())
            }
            Some(tip) => Err(CacheError::NotDifficultyTip {
                tip,
                requested: height,
            }),
            None => Err(CacheError::NotDifficultyTip {
                tip: Height::ZERO,
                requested: height,
            }),
        }
    }

    /// Drop every info below `height`, trimming the window after pruning.
    pub fn prune(&mut self, height: Height) {
        self.working = self.working.split_off(&height);
    }

    /// Publish the working window as the committed contents.
    pub fn commit(mut self) {
        let working = mem::take(&mut self.working);
        *self
            .cache
            .infos
            .write()
            .expect("block difficulty cache lock poisoned") = working;
    }
}

impl Drop for BlockDifficultyCacheDelta<'_> {
    fn drop(&mut self) {
        self.cache.delta_open.store(false, Ordering::Release);
    }
}
