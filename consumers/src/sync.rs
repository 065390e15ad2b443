//! The chain-sync consumer state machine.

use crate::error::{SyncAbort, SyncError};
use crate::handlers::{
    BlockChainSyncHandlers, ChainState, ObserverState, ParentBlockInfo, StateChangeInfo,
    TransactionsChangeInfo, ValidationResult,
};
use crate::input::{ConsumerInput, InputSource};
use ember_cache::{AccountStateCache, BlockDifficultyCache};
use ember_model::{BlockElement, TransactionInfo};
use ember_store::BlockStorageCache;
use ember_types::{ChainScore, Height};
use std::collections::HashSet;
use std::sync::Mutex;

/// Outcome of one sync.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncResult {
    /// The input was empty; nothing was inspected or mutated.
    Passthrough,
    /// The candidate replaced the local chain suffix.
    Committed {
        score_delta: ChainScore,
        height: Height,
    },
    /// The candidate was rejected; pre-sync state is untouched.
    Aborted(SyncAbort),
}

/// Replaces the locally stored chain suffix with an acceptable candidate.
///
/// One consumer call is one sync: pre-checks, difficulty check, unwind,
/// replay, score arbitration, then an atomic commit. Every rejection path
/// leaves storage, caches and the recalculation marker bit-identical to
/// their pre-sync state. The consumer runs to completion on its caller's
/// thread and is serialized by the chain-state mutex.
pub struct BlockChainSyncConsumer<'a> {
    account_cache: &'a AccountStateCache,
    difficulty_cache: &'a BlockDifficultyCache,
    storage: &'a BlockStorageCache,
    state: &'a Mutex<ChainState>,
    handlers: BlockChainSyncHandlers,
}

impl<'a> BlockChainSyncConsumer<'a> {
    pub fn new(
        account_cache: &'a AccountStateCache,
        difficulty_cache: &'a BlockDifficultyCache,
        storage: &'a BlockStorageCache,
        state: &'a Mutex<ChainState>,
        handlers: BlockChainSyncHandlers,
    ) -> Self {
        Self {
            account_cache,
            difficulty_cache,
            storage,
            state,
            handlers,
        }
    }

    /// Run one sync over `input`.
    ///
    /// The input is mutable because the processor rewrites per-element
    /// derived fields (generation hashes); on success the caller observes
    /// the updated elements.
    pub fn consume(&mut self, input: &mut ConsumerInput) -> Result<SyncResult, SyncError> {
        let Some(first_height) = input.first_height() else {
            return Ok(SyncResult::Passthrough);
        };

        let mut chain_state = self.state.lock().expect("chain state lock poisoned");

        // pre-checks: no state has been touched until these all pass
        let local_height = self.storage.view().chain_height()?;
        if !Self::is_link_valid(first_height, local_height, input.source())
            || !input.has_contiguous_heights()
        {
            tracing::debug!(
                %first_height,
                %local_height,
                source = ?input.source(),
                "rejecting unlinked candidate chain"
            );
            return Ok(SyncResult::Aborted(SyncAbort::RemoteChainUnlinked));
        }

        if !(self.handlers.difficulty_checker)(input.blocks(), self.difficulty_cache) {
            tracing::debug!(%first_height, "rejecting candidate chain with mismatched difficulties");
            return Ok(SyncResult::Aborted(SyncAbort::MismatchedDifficulties));
        }

        // everything past this point is staged in the deltas and the local
        // marker; dropping them discards the attempt
        let mut account_delta = self.account_cache.delta()?;
        let mut difficulty_delta = self.difficulty_cache.delta()?;
        let mut last_recalculation_height = chain_state.last_recalculation_height;

        // unwind stored blocks from the tip down to the common parent
        let common_height = first_height - 1;
        let mut unwound_elements: Vec<BlockElement> = Vec::new();
        {
            let storage_view = self.storage.view();
            let mut height = local_height;
            while height > common_height {
                let element = storage_view.load_block_element(height)?;
                let mut observer_state = ObserverState {
                    account_delta: &mut account_delta,
                    difficulty_delta: &mut difficulty_delta,
                    last_recalculation_height: &mut last_recalculation_height,
                };
                (self.handlers.undo_block)(&element, &mut observer_state)?;
                unwound_elements.push(element);
                height = height - 1;
            }
        }

        // score arbitration: both scores follow from the block difficulties
        // alone, so a tie or regression rejects before any replay work
        let candidate_score =
            ChainScore::from_difficulties(input.blocks().iter().map(|e| e.block.difficulty));
        let unwound_score =
            ChainScore::from_difficulties(unwound_elements.iter().map(|e| e.block.difficulty));
        let score_delta = match candidate_score.checked_sub(unwound_score) {
            Some(delta) if delta > ChainScore::ZERO => delta,
            _ => {
                tracing::debug!(
                    %candidate_score,
                    %unwound_score,
                    "rejecting candidate chain without score improvement"
                );
                return Ok(SyncResult::Aborted(SyncAbort::ScoreNotBetter));
            }
        };

        // replay the candidate on the unwound state
        let parent_element = self.storage.view().load_block_element(common_height)?;
        let parent_info = ParentBlockInfo {
            block: parent_element.block,
            hash: parent_element.entity_hash,
        };
        let processor_result = {
            let mut observer_state = ObserverState {
                account_delta: &mut account_delta,
                difficulty_delta: &mut difficulty_delta,
                last_recalculation_height: &mut last_recalculation_height,
            };
            (self.handlers.processor)(&parent_info, input.blocks_mut(), &mut observer_state)?
        };
        if processor_result != ValidationResult::Success {
            tracing::debug!(?processor_result, "processor rejected candidate chain");
            return Ok(SyncResult::Aborted(SyncAbort::Processor(processor_result)));
        }

        // commit: swap storage, publish, commit caches, advance the marker
        let new_height = input
            .blocks()
            .last()
            .map(BlockElement::height)
            .unwrap_or(common_height);

        self.swap_stored_blocks(common_height, input.blocks(), &unwound_elements)?;

        (self.handlers.state_change)(&StateChangeInfo {
            score_delta,
            cache_delta: &account_delta,
            height: new_height,
        });

        let (added_transaction_hashes, reverted_transaction_infos) =
            Self::partition_transaction_changes(input.blocks(), &unwound_elements);

        account_delta.commit();
        difficulty_delta.commit();

        (self.handlers.transactions_change)(TransactionsChangeInfo {
            added_transaction_hashes,
            reverted_transaction_infos,
        });

        chain_state.last_recalculation_height = last_recalculation_height;

        tracing::info!(%new_height, %score_delta, "committed candidate chain");
        Ok(SyncResult::Committed {
            score_delta,
            height: new_height,
        })
    }

    /// Height/source pre-checks: the candidate must attach at or below the
    /// tip + 1, must never touch the nemesis, and only a remote pull may
    /// rewrite stored history.
    fn is_link_valid(first_height: Height, local_height: Height, source: InputSource) -> bool {
        if first_height < Height::new(2) || first_height > local_height + 1 {
            return false;
        }

        first_height > local_height || InputSource::RemotePull == source
    }

    /// Replace everything above `common_height` with the candidate blocks.
    ///
    /// On failure the original suffix is restored best-effort before the
    /// error propagates; storage is crash-consistent at block granularity,
    /// so a partial swap never leaves a torn block.
    fn swap_stored_blocks(
        &self,
        common_height: Height,
        candidate: &[BlockElement],
        unwound: &[BlockElement],
    ) -> Result<(), SyncError> {
        let mut modifier = self.storage.modifier();
        modifier.drop_blocks_after(common_height)?;

        for element in candidate {
            if let Err(save_error) = modifier.save_block(element.clone()) {
                tracing::error!(
                    height = %element.height(),
                    error = %save_error,
                    "storage failure during commit, restoring original chain"
                );
                if let Err(restore_error) = Self::restore_blocks(&mut modifier, common_height, unwound)
                {
                    tracing::error!(
                        error = %restore_error,
                        "failed to restore original chain after storage failure"
                    );
                }
                return Err(save_error.into());
            }
        }

        Ok(())
    }

    fn restore_blocks(
        modifier: &mut ember_store::BlockStorageModifier<'_>,
        common_height: Height,
        unwound: &[BlockElement],
    ) -> Result<(), ember_store::StoreError> {
        modifier.drop_blocks_after(common_height)?;
        // unwound elements were collected tip-first; re-append bottom-up
        for element in unwound.iter().rev() {
            modifier.save_block(element.clone())?;
        }
        Ok(())
    }

    /// Split the confirmed-set difference: hashes present in both the
    /// candidate and the unwound blocks are neither added nor reverted.
    fn partition_transaction_changes(
        candidate: &[BlockElement],
        unwound: &[BlockElement],
    ) -> (HashSet<ember_types::Hash256>, Vec<TransactionInfo>) {
        let candidate_hashes: HashSet<_> = candidate
            .iter()
            .flat_map(|element| element.transaction_hashes())
            .collect();

        let mut reverted = Vec::new();
        let mut unwound_hashes = HashSet::new();
        for element in unwound {
            for transaction_element in &element.transactions {
                unwound_hashes.insert(transaction_element.entity_hash);
                if !candidate_hashes.contains(&transaction_element.entity_hash) {
                    reverted.push(TransactionInfo {
                        transaction: transaction_element.transaction.clone(),
                        entity_hash: transaction_element.entity_hash,
                        height: element.height(),
                    });
                }
            }
        }

        let added = candidate_hashes
            .into_iter()
            .filter(|hash| !unwound_hashes.contains(hash))
            .collect();

        (added, reverted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_validity_matrix() {
        let local = Height::new(100);
        let pull = InputSource::RemotePull;
        let push = InputSource::RemotePush;

        // below the nemesis successor is never valid
        assert!(!BlockChainSyncConsumer::is_link_valid(Height::new(0), local, pull));
        assert!(!BlockChainSyncConsumer::is_link_valid(Height::new(1), local, pull));

        // more than one past the tip is never valid
        assert!(!BlockChainSyncConsumer::is_link_valid(Height::new(102), local, pull));

        // rewriting stored history (at or below the tip) requires a pull
        for height in [Height::new(99), Height::new(100)] {
            assert!(BlockChainSyncConsumer::is_link_valid(height, local, pull));
            assert!(!BlockChainSyncConsumer::is_link_valid(height, local, push));
            assert!(!BlockChainSyncConsumer::is_link_valid(height, local, InputSource::Local));
            assert!(!BlockChainSyncConsumer::is_link_valid(height, local, InputSource::Unknown));
        }

        // extending one past the tip is valid for every source
        for source in [InputSource::Unknown, InputSource::Local, pull, push] {
            assert!(BlockChainSyncConsumer::is_link_valid(Height::new(101), local, source));
        }
    }
}
