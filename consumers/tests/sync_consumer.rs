//! End-to-end scenarios for the chain-sync consumer.
//!
//! The injected handlers are mocks that capture their parameters and mark
//! the observer state, so every test can assert exactly which stages ran,
//! what they saw, and whether the commit happened.

use ember_cache::{
    AccountStateCache, AccountStateCacheOptions, BlockDifficultyCache, BlockDifficultyInfo,
    ReadOnlyAccountStateCache,
};
use ember_consumers::{
    BlockChainSyncConsumer, BlockChainSyncHandlers, ChainState, ConsumerInput, InputSource,
    SyncAbort, SyncError, SyncResult, ValidationResult,
};
use ember_model::{Block, BlockElement, EntityType, Transaction, BLOCK_VERSION};
use ember_store::{BlockStorage, BlockStorageCache, MemoryBlockStorage, StoreError};
use ember_types::{
    Amount, ChainScore, Difficulty, Hash256, Height, ImportanceHeight, MosaicId, NetworkId,
    PublicKey, Signature, Timestamp,
};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

const INITIAL_MARKER: ImportanceHeight = ImportanceHeight::new(1234);
const MODIFIED_MARKER: ImportanceHeight = ImportanceHeight::new(7777);
/// Baseline account whose presence proves the right cache flowed through.
const MARKER_KEY: PublicKey = PublicKey::new([0x3A; 32]);
/// Account added by the processor; its presence proves the delta committed.
const SENTINEL_KEY: PublicKey = PublicKey::new([0x5E; 32]);

const BASE: u64 = Difficulty::BASE.raw();

fn test_options() -> AccountStateCacheOptions {
    AccountStateCacheOptions {
        network_id: NetworkId::Test,
        importance_grouping: 50,
        min_harvester_balance: Amount::new(1_000),
        max_harvester_balance: Amount::new(100_000),
        harvesting_mosaic_id: MosaicId::new(9876),
        currency_mosaic_id: MosaicId::new(1234),
    }
}

fn random_hash() -> Hash256 {
    Hash256::new(rand::random())
}

fn make_transaction() -> Transaction {
    Transaction {
        entity_type: EntityType::new(0x4154),
        version: 1,
        network: NetworkId::Test,
        signer_public_key: PublicKey::new(rand::random()),
        max_fee: Amount::new(100),
        deadline: Timestamp::new(10_000),
        signature: Signature::ZERO,
        payload: Vec::new(),
    }
}

fn make_block(height: u64, num_transactions: usize) -> Block {
    Block {
        version: BLOCK_VERSION,
        network: NetworkId::Test,
        signer_public_key: PublicKey::new(rand::random()),
        beneficiary_public_key: PublicKey::ZERO,
        height: Height::new(height),
        timestamp: Timestamp::new(height * 1000),
        difficulty: Difficulty::BASE,
        fee_multiplier: 0,
        signature: Signature::ZERO,
        transactions: (0..num_transactions).map(|_| make_transaction()).collect(),
    }
}

/// A block element with a random entity hash and random transaction hashes.
fn make_element(height: u64, num_transactions: usize) -> BlockElement {
    let mut element = BlockElement::new(make_block(height, num_transactions), random_hash());
    for transaction_element in &mut element.transactions {
        transaction_element.entity_hash = random_hash();
    }
    element
}

#[derive(Clone)]
struct UndoCall {
    block: Block,
    marker: ImportanceHeight,
    saw_marker_account: bool,
    num_difficulty_infos: usize,
}

#[derive(Clone)]
struct ProcessorCall {
    parent_block: Block,
    parent_hash: Hash256,
    first_height: Height,
    num_elements: usize,
    marker: ImportanceHeight,
    saw_marker_account: bool,
    num_difficulty_infos: usize,
}

#[derive(Clone)]
struct StateChangeCall {
    score_delta: ChainScore,
    saw_sentinel: bool,
    height: Height,
}

#[derive(Clone)]
struct TransactionsChangeCall {
    added: HashSet<Hash256>,
    reverted: HashSet<Hash256>,
}

struct Fixture {
    account_cache: AccountStateCache,
    difficulty_cache: BlockDifficultyCache,
    storage: BlockStorageCache,
    state: Mutex<ChainState>,
    /// Originally stored elements at heights 2..=L, in height order.
    original_elements: Vec<BlockElement>,

    difficulty_checks: Rc<RefCell<Vec<Vec<Height>>>>,
    undo_calls: Rc<RefCell<Vec<UndoCall>>>,
    processor_calls: Rc<RefCell<Vec<ProcessorCall>>>,
    state_changes: Rc<RefCell<Vec<StateChangeCall>>>,
    transactions_changes: Rc<RefCell<Vec<TransactionsChangeCall>>>,

    difficulty_ok: Rc<Cell<bool>>,
    processor_result: Rc<Cell<ValidationResult>>,
    undo_fails: Rc<Cell<bool>>,
}

impl Fixture {
    fn new(local_height: u64, transactions_per_block: usize) -> Self {
        Self::with_backend(
            Box::new(MemoryBlockStorage::new(NetworkId::Test)),
            local_height,
            transactions_per_block,
        )
    }

    fn with_backend(
        backend: Box<dyn BlockStorage>,
        local_height: u64,
        transactions_per_block: usize,
    ) -> Self {
        let account_cache = AccountStateCache::new(test_options());
        {
            let mut delta = account_cache.delta().unwrap();
            delta.add_account_by_key(&MARKER_KEY, Height::ONE);
            delta.commit();
        }

        let storage = BlockStorageCache::new(backend);
        let mut original_elements = Vec::new();
        {
            let mut modifier = storage.modifier();
            for height in 2..=local_height {
                let element = make_element(height, transactions_per_block);
                modifier.save_block(element.clone()).unwrap();
                original_elements.push(element);
            }
        }

        Self {
            account_cache,
            difficulty_cache: BlockDifficultyCache::new(),
            storage,
            state: Mutex::new(ChainState {
                last_recalculation_height: INITIAL_MARKER,
            }),
            original_elements,
            difficulty_checks: Rc::new(RefCell::new(Vec::new())),
            undo_calls: Rc::new(RefCell::new(Vec::new())),
            processor_calls: Rc::new(RefCell::new(Vec::new())),
            state_changes: Rc::new(RefCell::new(Vec::new())),
            transactions_changes: Rc::new(RefCell::new(Vec::new())),
            difficulty_ok: Rc::new(Cell::new(true)),
            processor_result: Rc::new(Cell::new(ValidationResult::Success)),
            undo_fails: Rc::new(Cell::new(false)),
        }
    }

    fn handlers(&self) -> BlockChainSyncHandlers {
        let difficulty_checks = Rc::clone(&self.difficulty_checks);
        let difficulty_ok = Rc::clone(&self.difficulty_ok);
        let undo_calls = Rc::clone(&self.undo_calls);
        let processor_calls = Rc::clone(&self.processor_calls);
        let processor_result = Rc::clone(&self.processor_result);
        let state_changes = Rc::clone(&self.state_changes);
        let transactions_changes = Rc::clone(&self.transactions_changes);
        let undo_fails = Rc::clone(&self.undo_fails);

        BlockChainSyncHandlers {
            difficulty_checker: Box::new(move |elements, _cache| {
                difficulty_checks
                    .borrow_mut()
                    .push(elements.iter().map(BlockElement::height).collect());
                difficulty_ok.get()
            }),
            undo_block: Box::new(move |element, state| {
                if undo_fails.get() {
                    return Err(ember_cache::CacheError::MissingMainAccount(
                        ember_types::Address::ZERO,
                    )
                    .into());
                }

                let num_difficulty_infos = state.difficulty_delta.len();
                undo_calls.borrow_mut().push(UndoCall {
                    block: element.block.clone(),
                    marker: *state.last_recalculation_height,
                    saw_marker_account: state.account_delta.contains_public_key(&MARKER_KEY),
                    num_difficulty_infos,
                });

                // mark the observer state by modifying it
                state.difficulty_delta.insert(BlockDifficultyInfo::new(
                    Height::new(num_difficulty_infos as u64 + 1),
                    Timestamp::EPOCH,
                    Difficulty::BASE,
                ))?;
                *state.last_recalculation_height =
                    ImportanceHeight::new(state.last_recalculation_height.raw() + 1);
                Ok(())
            }),
            processor: Box::new(move |parent_info, elements, state| {
                processor_calls.borrow_mut().push(ProcessorCall {
                    parent_block: parent_info.block.clone(),
                    parent_hash: parent_info.hash,
                    first_height: elements.first().map(BlockElement::height).unwrap_or(Height::ZERO),
                    num_elements: elements.len(),
                    marker: *state.last_recalculation_height,
                    saw_marker_account: state.account_delta.contains_public_key(&MARKER_KEY),
                    num_difficulty_infos: state.difficulty_delta.len(),
                });

                // mark the observer state by modifying it
                state.account_delta.add_account_by_key(&SENTINEL_KEY, Height::ONE);
                *state.last_recalculation_height = MODIFIED_MARKER;

                // fill in per-element derived fields
                for element in elements.iter_mut() {
                    element.generation_hash =
                        Hash256::new([element.block.height.raw() as u8; 32]);
                }

                Ok(processor_result.get())
            }),
            state_change: Box::new(move |info| {
                state_changes.borrow_mut().push(StateChangeCall {
                    score_delta: info.score_delta,
                    saw_sentinel: info.cache_delta.lookup_by_key(&SENTINEL_KEY).is_some(),
                    height: info.height,
                });
            }),
            transactions_change: Box::new(move |info| {
                transactions_changes.borrow_mut().push(TransactionsChangeCall {
                    added: info.added_transaction_hashes.clone(),
                    reverted: info
                        .reverted_transaction_infos
                        .iter()
                        .map(|transaction_info| transaction_info.entity_hash)
                        .collect(),
                });
            }),
        }
    }

    fn try_run(&self, input: &mut ConsumerInput) -> Result<SyncResult, SyncError> {
        let handlers = self.handlers();
        let mut consumer = BlockChainSyncConsumer::new(
            &self.account_cache,
            &self.difficulty_cache,
            &self.storage,
            &self.state,
            handlers,
        );
        consumer.consume(input)
    }

    fn run(&self, input: &mut ConsumerInput) -> SyncResult {
        self.try_run(input).unwrap()
    }

    fn create_input(&self, start_height: u64, num_blocks: u64, source: InputSource) -> ConsumerInput {
        self.create_input_with_transactions(start_height, num_blocks, 0, source)
    }

    fn create_input_with_transactions(
        &self,
        start_height: u64,
        num_blocks: u64,
        transactions_per_block: usize,
        source: InputSource,
    ) -> ConsumerInput {
        let elements = (start_height..start_height + num_blocks)
            .map(|height| make_element(height, transactions_per_block))
            .collect();
        ConsumerInput::new(elements, source)
    }

    /// Hash of transaction `transaction_index` in the stored block at
    /// `height`.
    fn stored_transaction_hash(&self, height: u64, transaction_index: usize) -> Hash256 {
        self.original_elements[height as usize - 2].transactions[transaction_index].entity_hash
    }

    /// All transaction hashes stored in blocks `from..=to`.
    fn stored_transaction_hashes(&self, from: u64, to: u64) -> HashSet<Hash256> {
        (from..=to)
            .flat_map(|height| {
                self.original_elements[height as usize - 2]
                    .transactions
                    .iter()
                    .map(|transaction_element| transaction_element.entity_hash)
            })
            .collect()
    }

    fn assert_difficulty_checker_invocation(&self, input: &ConsumerInput) {
        let checks = self.difficulty_checks.borrow();
        assert_eq!(1, checks.len(), "difficulty checker invocations");
        let expected: Vec<Height> = input.blocks().iter().map(BlockElement::height).collect();
        assert_eq!(expected, checks[0]);
    }

    fn assert_unwind(&self, unwound_heights: &[u64]) {
        let calls = self.undo_calls.borrow();
        assert_eq!(unwound_heights.len(), calls.len(), "undo invocations");
        for (i, (&height, call)) in unwound_heights.iter().zip(calls.iter()).enumerate() {
            let expected = &self.original_elements[height as usize - 2];
            assert_eq!(expected.block, call.block, "undone block at {i}");
            assert_eq!(
                ImportanceHeight::new(INITIAL_MARKER.raw() + i as u64),
                call.marker,
                "marker during undo at {i}"
            );
            assert!(call.saw_marker_account, "marked cache during undo at {i}");
            assert_eq!(i, call.num_difficulty_infos, "difficulty infos at undo {i}");
        }
    }

    fn assert_processor_invocation(&self, input: &ConsumerInput, num_unwound: usize) {
        let calls = self.processor_calls.borrow();
        assert_eq!(1, calls.len(), "processor invocations");
        let call = &calls[0];

        let parent_height = input.first_height().unwrap() - 1;
        let parent = self
            .storage
            .view()
            .load_block_element(parent_height)
            .unwrap();
        assert_eq!(parent.block, call.parent_block);
        assert_eq!(parent.entity_hash, call.parent_hash);
        assert_eq!(input.first_height().unwrap(), call.first_height);
        assert_eq!(input.blocks().len(), call.num_elements);
        assert_eq!(
            ImportanceHeight::new(INITIAL_MARKER.raw() + num_unwound as u64),
            call.marker
        );
        assert!(call.saw_marker_account);
        assert_eq!(num_unwound, call.num_difficulty_infos);
    }

    fn assert_no_storage_changes(&self) {
        // all original blocks are still in storage
        let view = self.storage.view();
        let expected_height = Height::new(self.original_elements.len() as u64 + 1);
        assert_eq!(expected_height, view.chain_height().unwrap());
        for element in &self.original_elements {
            let stored = view.load_block_element(element.height()).unwrap();
            assert_eq!(element, &stored, "at height {}", element.height());
        }

        // the cache deltas were not committed
        assert!(self
            .account_cache
            .view()
            .get_by_key(&SENTINEL_KEY)
            .is_none());
        assert_eq!(0, self.difficulty_cache.view().len());

        // no notifications were published
        assert!(self.state_changes.borrow().is_empty());
        assert!(self.transactions_changes.borrow().is_empty());

        // the marker was not advanced
        assert_eq!(
            INITIAL_MARKER,
            self.state.lock().unwrap().last_recalculation_height
        );
    }

    fn assert_stored(&self, input: &ConsumerInput, expected_score_delta: ChainScore) {
        // every candidate block replaced the stored suffix
        let view = self.storage.view();
        let first_height = input.first_height().unwrap();
        let chain_height = view.chain_height().unwrap();
        assert_eq!(
            first_height + input.blocks().len() as u64 - 1,
            chain_height
        );
        for element in input.blocks() {
            let stored = view.load_block_element(element.height()).unwrap();
            assert_eq!(element, &stored, "at height {}", element.height());
        }

        // non-conflicting original blocks survived
        for element in &self.original_elements {
            if element.height() < first_height {
                let stored = view.load_block_element(element.height()).unwrap();
                assert_eq!(element, &stored, "at height {}", element.height());
            }
        }

        // the account cache delta was committed
        assert!(self
            .account_cache
            .view()
            .get_by_key(&SENTINEL_KEY)
            .is_some());

        // the state change was announced once, with the delta visible
        let state_changes = self.state_changes.borrow();
        assert_eq!(1, state_changes.len());
        assert_eq!(expected_score_delta, state_changes[0].score_delta);
        assert!(state_changes[0].saw_sentinel);
        assert_eq!(chain_height, state_changes[0].height);

        // the transactions change was announced once
        assert_eq!(1, self.transactions_changes.borrow().len());

        // the marker was replaced with the processor's value
        assert_eq!(
            MODIFIED_MARKER,
            self.state.lock().unwrap().last_recalculation_height
        );
    }
}

// --- empty input ---

#[test]
fn empty_input_passes_through() {
    let fixture = Fixture::new(7, 0);
    let mut input = ConsumerInput::new(Vec::new(), InputSource::RemotePull);

    let result = fixture.run(&mut input);

    assert_eq!(SyncResult::Passthrough, result);
    assert!(fixture.difficulty_checks.borrow().is_empty());
    assert!(fixture.undo_calls.borrow().is_empty());
    assert!(fixture.processor_calls.borrow().is_empty());
    fixture.assert_no_storage_changes();
}

// --- height / source pre-checks ---

fn all_sources() -> [InputSource; 4] {
    [
        InputSource::Unknown,
        InputSource::Local,
        InputSource::RemotePull,
        InputSource::RemotePush,
    ]
}

fn assert_invalid_height(local: u64, remote: u64, num_blocks: u64, source: InputSource) {
    let fixture = Fixture::new(local, 0);
    let mut input = fixture.create_input(remote, num_blocks, source);

    let result = fixture.run(&mut input);

    assert_eq!(
        SyncResult::Aborted(SyncAbort::RemoteChainUnlinked),
        result,
        "local {local} remote {remote} source {source:?}"
    );
    assert!(fixture.difficulty_checks.borrow().is_empty());
    assert!(fixture.undo_calls.borrow().is_empty());
    assert!(fixture.processor_calls.borrow().is_empty());
    fixture.assert_no_storage_changes();
}

fn assert_valid_height(local: u64, remote: u64, num_blocks: u64, source: InputSource) {
    let fixture = Fixture::new(local, 0);
    let mut input = fixture.create_input(remote, num_blocks, source);

    fixture.run(&mut input);

    // whenever the height is valid, the difficulty checker must have run
    assert_eq!(
        1,
        fixture.difficulty_checks.borrow().len(),
        "local {local} remote {remote} source {source:?}"
    );
}

#[test]
fn candidate_starting_below_height_two_is_rejected() {
    for source in all_sources() {
        assert_invalid_height(1, 0, 3, source);
        assert_invalid_height(1, 1, 3, source);
    }
}

#[test]
fn candidate_starting_at_height_two_is_valid() {
    for source in all_sources() {
        assert_valid_height(1, 2, 3, source);
        assert_valid_height(2, 3, 3, source);
    }
}

#[test]
fn candidate_more_than_one_past_the_tip_is_rejected() {
    for source in all_sources() {
        assert_invalid_height(100, 102, 3, source);
        assert_invalid_height(100, 200, 3, source);
    }
}

#[test]
fn candidate_at_or_below_the_tip_is_only_valid_for_remote_pull() {
    // rewriting stored history, even just the tip block, needs a pull
    for source in all_sources() {
        if InputSource::RemotePull == source {
            assert_valid_height(100, 100, 1, source);
            assert_valid_height(100, 99, 1, source);
            assert_valid_height(100, 90, 1, source);
        } else {
            assert_invalid_height(100, 100, 1, source);
            assert_invalid_height(100, 99, 1, source);
            assert_invalid_height(100, 90, 1, source);
        }
    }
}

#[test]
fn candidate_one_past_the_tip_is_valid_for_all_sources() {
    for source in all_sources() {
        assert_valid_height(100, 101, 1, source);
    }
}

#[test]
fn candidate_with_non_contiguous_heights_is_rejected() {
    let fixture = Fixture::new(7, 0);
    let elements = vec![make_element(8, 0), make_element(10, 0)];
    let mut input = ConsumerInput::new(elements, InputSource::RemotePull);

    let result = fixture.run(&mut input);

    assert_eq!(SyncResult::Aborted(SyncAbort::RemoteChainUnlinked), result);
    fixture.assert_no_storage_changes();
}

// --- difficulty check ---

#[test]
fn candidate_with_mismatched_difficulties_is_rejected() {
    let fixture = Fixture::new(3, 0);
    fixture.difficulty_ok.set(false);
    let mut input = fixture.create_input(4, 2, InputSource::RemotePull);

    let result = fixture.run(&mut input);

    assert_eq!(
        SyncResult::Aborted(SyncAbort::MismatchedDifficulties),
        result
    );
    assert!(fixture.undo_calls.borrow().is_empty());
    assert!(fixture.processor_calls.borrow().is_empty());
    fixture.assert_difficulty_checker_invocation(&input);
    fixture.assert_no_storage_changes();
}

// --- score arbitration ---

#[test]
fn candidate_with_smaller_score_is_rejected() {
    // local blocks 2..=7; candidate replaces 5..=6 (three blocks unwound)
    let fixture = Fixture::new(7, 0);
    let mut input = fixture.create_input(5, 2, InputSource::RemotePull);

    let result = fixture.run(&mut input);

    assert_eq!(SyncResult::Aborted(SyncAbort::ScoreNotBetter), result);
    fixture.assert_difficulty_checker_invocation(&input);
    fixture.assert_unwind(&[7, 6, 5]);
    // the score already rules the candidate out, so it is never replayed
    assert!(fixture.processor_calls.borrow().is_empty());
    fixture.assert_no_storage_changes();
}

#[test]
fn candidate_with_identical_score_is_rejected() {
    // local blocks 2..=7; candidate replaces 6..=7 with equal difficulty
    let fixture = Fixture::new(7, 0);
    let mut input = fixture.create_input(6, 2, InputSource::RemotePull);

    let result = fixture.run(&mut input);

    assert_eq!(SyncResult::Aborted(SyncAbort::ScoreNotBetter), result);
    fixture.assert_unwind(&[7, 6]);
    assert!(fixture.processor_calls.borrow().is_empty());
    fixture.assert_no_storage_changes();
}

// --- processor rejection ---

fn assert_processor_rejection(processor_result: ValidationResult) {
    let fixture = Fixture::new(3, 0);
    fixture.processor_result.set(processor_result);
    let mut input = fixture.create_input(4, 2, InputSource::RemotePull);

    let result = fixture.run(&mut input);

    assert_eq!(
        SyncResult::Aborted(SyncAbort::Processor(processor_result)),
        result
    );
    assert!(fixture.undo_calls.borrow().is_empty());
    fixture.assert_difficulty_checker_invocation(&input);
    fixture.assert_processor_invocation(&input, 0);
    fixture.assert_no_storage_changes();
}

#[test]
fn neutral_processor_result_aborts() {
    assert_processor_rejection(ValidationResult::Neutral);
}

#[test]
fn failure_processor_result_aborts() {
    assert_processor_rejection(ValidationResult::Failure);
}

// --- successful syncs ---

#[test]
fn compatible_chains_sync_without_unwinding() {
    // local blocks 2..=7; candidate extends with 8..=11
    let fixture = Fixture::new(7, 0);
    let mut input = fixture.create_input(8, 4, InputSource::RemotePull);

    let result = fixture.run(&mut input);

    assert!(matches!(result, SyncResult::Committed { .. }));
    assert!(fixture.undo_calls.borrow().is_empty());
    fixture.assert_difficulty_checker_invocation(&input);
    fixture.assert_processor_invocation(&input, 0);
    fixture.assert_stored(&input, ChainScore::new(4 * (BASE as u128 - 1)));
}

#[test]
fn fork_replaces_local_suffix() {
    // local blocks 2..=7; candidate rewrites 5..=8
    let fixture = Fixture::new(7, 0);
    let mut input = fixture.create_input(5, 4, InputSource::RemotePull);

    let result = fixture.run(&mut input);

    assert!(matches!(result, SyncResult::Committed { .. }));
    fixture.assert_difficulty_checker_invocation(&input);
    fixture.assert_unwind(&[7, 6, 5]);
    fixture.assert_processor_invocation(&input, 3);
    fixture.assert_stored(&input, ChainScore::new(BASE as u128 - 1));
}

#[test]
fn fork_replacing_only_the_tip_block() {
    // local blocks 2..=7; candidate rewrites 7..=10
    let fixture = Fixture::new(7, 0);
    let mut input = fixture.create_input(7, 4, InputSource::RemotePull);

    let result = fixture.run(&mut input);

    assert!(matches!(result, SyncResult::Committed { .. }));
    fixture.assert_unwind(&[7]);
    fixture.assert_processor_invocation(&input, 1);
    fixture.assert_stored(&input, ChainScore::new(3 * (BASE as u128 - 1)));
}

#[test]
fn shorter_but_heavier_pull_replaces_longer_suffix() {
    // local blocks 2..=7; a single candidate block at 5 with triple difficulty
    let fixture = Fixture::new(7, 0);
    let mut input = fixture.create_input(5, 1, InputSource::RemotePull);
    input.blocks_mut()[0].block.difficulty = Difficulty::new(3 * BASE);

    let result = fixture.run(&mut input);

    assert_eq!(
        SyncResult::Committed {
            score_delta: ChainScore::new(2),
            height: Height::new(5),
        },
        result
    );
    fixture.assert_unwind(&[7, 6, 5]);
    fixture.assert_processor_invocation(&input, 3);
    fixture.assert_stored(&input, ChainScore::new(2));
}

// --- transaction change notification ---

#[test]
fn compatible_sync_reports_only_added_transactions() {
    // local blocks 2..=7 with 3 transactions each; candidate 8..=11 likewise
    let fixture = Fixture::new(7, 3);
    let mut input = fixture.create_input_with_transactions(8, 4, 3, InputSource::RemotePull);

    let result = fixture.run(&mut input);

    assert!(matches!(result, SyncResult::Committed { .. }));
    let changes = fixture.transactions_changes.borrow();
    assert_eq!(1, changes.len());

    let expected_added: HashSet<Hash256> = input
        .blocks()
        .iter()
        .flat_map(|element| element.transaction_hashes())
        .collect();
    assert_eq!(12, changes[0].added.len());
    assert_eq!(expected_added, changes[0].added);
    assert!(changes[0].reverted.is_empty());
}

#[test]
fn fork_reports_added_and_reverted_transactions() {
    // local blocks 2..=7 with 3 transactions each; candidate rewrites 5..=8
    let fixture = Fixture::new(7, 3);
    let mut input = fixture.create_input_with_transactions(5, 4, 3, InputSource::RemotePull);
    let expected_reverted = fixture.stored_transaction_hashes(5, 7);

    let result = fixture.run(&mut input);

    assert!(matches!(result, SyncResult::Committed { .. }));
    fixture.assert_unwind(&[7, 6, 5]);
    let changes = fixture.transactions_changes.borrow();
    assert_eq!(1, changes.len());
    assert_eq!(12, changes[0].added.len());
    assert_eq!(9, changes[0].reverted.len());
    assert_eq!(expected_reverted, changes[0].reverted);
}

#[test]
fn shared_transactions_are_neither_added_nor_reverted() {
    // local blocks 2..=7 with 3 transactions each; candidate rewrites 5..=8
    // and re-includes two locally stored transactions
    let fixture = Fixture::new(7, 3);
    let mut input = fixture.create_input_with_transactions(5, 4, 3, InputSource::RemotePull);

    let shared_one = fixture.stored_transaction_hash(7, 1);
    let shared_two = fixture.stored_transaction_hash(5, 2);
    input.blocks_mut()[0].transactions[0].entity_hash = shared_one;
    input.blocks_mut()[2].transactions[1].entity_hash = shared_two;

    let mut expected_reverted = fixture.stored_transaction_hashes(5, 7);
    expected_reverted.remove(&shared_one);
    expected_reverted.remove(&shared_two);

    let result = fixture.run(&mut input);

    assert!(matches!(result, SyncResult::Committed { .. }));
    fixture.assert_unwind(&[7, 6, 5]);
    let changes = fixture.transactions_changes.borrow();
    assert_eq!(1, changes.len());

    // 12 candidate hashes minus the 2 shared ones
    assert_eq!(10, changes[0].added.len());
    assert!(!changes[0].added.contains(&shared_one));
    assert!(!changes[0].added.contains(&shared_two));

    // 9 stored hashes minus the 2 shared ones
    assert_eq!(7, changes[0].reverted.len());
    assert_eq!(expected_reverted, changes[0].reverted);
}

// --- element updates ---

#[test]
fn processor_updates_to_input_elements_are_observable() {
    let fixture = Fixture::new(7, 0);
    let mut input = fixture.create_input(8, 4, InputSource::RemotePull);
    for element in input.blocks_mut() {
        element.generation_hash = Hash256::ZERO;
    }

    let result = fixture.run(&mut input);

    assert!(matches!(result, SyncResult::Committed { .. }));
    for (i, element) in input.blocks().iter().enumerate() {
        let expected = Hash256::new([8 + i as u8; 32]);
        assert_eq!(expected, element.generation_hash, "generation hash at {i}");
    }
}

// --- fatal failures ---

/// A storage backend whose next save at one configurable height fails.
/// The fault is one-shot so the consumer's restore path can succeed.
struct FailingStorage {
    inner: MemoryBlockStorage,
    /// Height whose next save fails; zero disables the fault.
    fail_on_save_at: Arc<AtomicU64>,
}

impl BlockStorage for FailingStorage {
    fn chain_height(&self) -> Result<Height, StoreError> {
        self.inner.chain_height()
    }

    fn load_block(&self, height: Height) -> Result<Block, StoreError> {
        self.inner.load_block(height)
    }

    fn load_block_element(&self, height: Height) -> Result<BlockElement, StoreError> {
        self.inner.load_block_element(height)
    }

    fn save_block(&mut self, element: BlockElement) -> Result<(), StoreError> {
        let target = self.fail_on_save_at.load(Ordering::SeqCst);
        if target != 0 && element.height().raw() == target {
            self.fail_on_save_at.store(0, Ordering::SeqCst);
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.inner.save_block(element)
    }

    fn drop_blocks_after(&mut self, height: Height) -> Result<(), StoreError> {
        self.inner.drop_blocks_after(height)
    }
}

#[test]
fn storage_failure_during_commit_restores_original_chain() {
    let fail_at = Arc::new(AtomicU64::new(0));
    let backend = FailingStorage {
        inner: MemoryBlockStorage::new(NetworkId::Test),
        fail_on_save_at: Arc::clone(&fail_at),
    };
    let fixture = Fixture::with_backend(Box::new(backend), 7, 0);

    // saving the third candidate block (height 7) fails mid-commit
    fail_at.store(7, Ordering::SeqCst);
    let mut input = fixture.create_input(5, 4, InputSource::RemotePull);

    let result = fixture.try_run(&mut input);

    assert!(matches!(result, Err(SyncError::Store(_))));
    fixture.assert_no_storage_changes();
}

#[test]
fn fatal_observer_error_propagates_and_leaves_state_untouched() {
    let fixture = Fixture::new(7, 0);
    fixture.undo_fails.set(true);
    let mut input = fixture.create_input(5, 4, InputSource::RemotePull);

    let result = fixture.try_run(&mut input);

    assert!(matches!(result, Err(SyncError::Cache(_))));
    assert!(fixture.processor_calls.borrow().is_empty());
    fixture.assert_no_storage_changes();

    // the deltas were released, so a later sync can still run
    fixture.undo_fails.set(false);
    let mut accepted = fixture.create_input(8, 1, InputSource::RemotePull);
    assert!(matches!(
        fixture.run(&mut accepted),
        SyncResult::Committed { .. }
    ));
}

// --- post-abort reusability ---

#[test]
fn aborted_sync_releases_the_cache_deltas() {
    let fixture = Fixture::new(7, 0);
    let mut rejected = fixture.create_input(5, 2, InputSource::RemotePull);
    assert_eq!(
        SyncResult::Aborted(SyncAbort::ScoreNotBetter),
        fixture.run(&mut rejected)
    );

    // a subsequent sync can open the deltas again and commit
    let mut accepted = fixture.create_input(8, 1, InputSource::RemotePull);
    let result = fixture.run(&mut accepted);
    assert!(matches!(result, SyncResult::Committed { .. }));
}
