//! Host-injected collaborators of the sync consumer.
//!
//! The consumer consumes these as opaque callables; everything a block
//! actually *does* to state lives behind `undo_block` and `processor`.

use crate::error::SyncError;
use ember_cache::{
    AccountStateCacheDelta, BlockDifficultyCache, BlockDifficultyCacheDelta,
    ReadOnlyAccountStateCache,
};
use ember_model::{Block, BlockElement, TransactionInfo};
use ember_types::{ChainScore, Hash256, Height, ImportanceHeight};
use std::collections::HashSet;

/// Result of replaying a candidate suffix. Anything other than `Success`
/// aborts the sync and is propagated to the caller verbatim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationResult {
    Success,
    Neutral,
    Failure,
}

/// Mutable chain-global state owned by the host; the enclosing mutex is the
/// chain-write lock serializing syncs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChainState {
    /// Height of the last importance recalculation.
    pub last_recalculation_height: ImportanceHeight,
}

/// The state handed to undo and processor callbacks: the open cache deltas
/// plus the in-flight recalculation marker.
pub struct ObserverState<'r, 'c> {
    pub account_delta: &'r mut AccountStateCacheDelta<'c>,
    pub difficulty_delta: &'r mut BlockDifficultyCacheDelta<'c>,
    pub last_recalculation_height: &'r mut ImportanceHeight,
}

/// The stored block a candidate chain part attaches to.
#[derive(Clone, Debug)]
pub struct ParentBlockInfo {
    pub block: Block,
    pub hash: Hash256,
}

/// Data published once per successful sync, before transaction changes.
pub struct StateChangeInfo<'a> {
    pub score_delta: ChainScore,
    /// Read access to the staged cache changes.
    pub cache_delta: &'a dyn ReadOnlyAccountStateCache,
    pub height: Height,
}

/// The confirmed-set difference published once per successful sync.
///
/// A hash never appears in both collections: transactions shared between
/// the unwound and candidate chain parts are neither added nor reverted.
pub struct TransactionsChangeInfo {
    pub added_transaction_hashes: HashSet<Hash256>,
    pub reverted_transaction_infos: Vec<TransactionInfo>,
}

/// Checks candidate block difficulties against the local window. Pure.
pub type DifficultyChecker = Box<dyn Fn(&[BlockElement], &BlockDifficultyCache) -> bool>;

/// Undoes one stored block; must be the exact inverse of the prior apply.
pub type UndoBlock = Box<dyn Fn(&BlockElement, &mut ObserverState<'_, '_>) -> Result<(), SyncError>>;

/// Replays the candidate suffix on the unwound state. May mutate the
/// elements (derived fields) and the deltas; must be a no-op on non-Success.
pub type Processor = Box<
    dyn Fn(
        &ParentBlockInfo,
        &mut [BlockElement],
        &mut ObserverState<'_, '_>,
    ) -> Result<ValidationResult, SyncError>,
>;

/// Receives the state-change announcement. Called exactly once per
/// successful sync.
pub type StateChange = Box<dyn FnMut(&StateChangeInfo<'_>)>;

/// Receives the confirmed-transaction-set difference. Called exactly once
/// per successful sync, after the state change.
pub type TransactionsChange = Box<dyn FnMut(TransactionsChangeInfo)>;

/// The full set of injected collaborators.
pub struct BlockChainSyncHandlers {
    pub difficulty_checker: DifficultyChecker,
    pub undo_block: UndoBlock,
    pub processor: Processor,
    pub state_change: StateChange,
    pub transactions_change: TransactionsChange,
}
