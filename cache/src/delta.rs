//! The account-state cache write delta.

use crate::account_cache::{AccountStateCache, ReadOnlyAccountStateCache};
use crate::high_value::{HighValueAccounts, HighValueAccountsUpdater};
use crate::options::AccountStateCacheOptions;
use ember_state::AccountState;
use ember_types::{Address, Height, PublicKey};
use std::collections::{BTreeSet, HashMap};
use std::mem;
use std::sync::atomic::Ordering;

/// A transactional, copy-on-write layer over the account-state cache.
///
/// The delta is the only legal mutator of account state during block
/// processing. Changes become visible on [`commit`](Self::commit); dropping
/// the delta discards every staged change. Observers issue speculative
/// removes, so removal of a missing or height-mismatched account is silent.
pub struct AccountStateCacheDelta<'a> {
    cache: &'a AccountStateCache,
    options: AccountStateCacheOptions,

    /// Accounts created by this delta (absent from the baseline).
    added: HashMap<Address, AccountState>,
    /// Baseline accounts copied on first write.
    modified: HashMap<Address, AccountState>,
    /// Baseline accounts removed by this delta.
    removed: BTreeSet<Address>,
    /// Secondary-index changes: `Some` inserts a mapping, `None` removes it.
    key_overlay: HashMap<PublicKey, Option<Address>>,

    queued_remove_by_address: BTreeSet<(Height, Address)>,
    queued_remove_by_key: BTreeSet<(Height, PublicKey)>,
}

impl<'a> AccountStateCacheDelta<'a> {
    pub(crate) fn new(cache: &'a AccountStateCache) -> Self {
        let options = *cache.options();
        Self {
            cache,
            options,
            added: HashMap::new(),
            modified: HashMap::new(),
            removed: BTreeSet::new(),
            key_overlay: HashMap::new(),
            queued_remove_by_address: BTreeSet::new(),
            queued_remove_by_key: BTreeSet::new(),
        }
    }

    pub fn options(&self) -> &AccountStateCacheOptions {
        &self.options
    }

    // --- reads ---

    pub fn contains(&self, address: &Address) -> bool {
        if self.removed.contains(address) {
            return false;
        }
        self.added.contains_key(address)
            || self.modified.contains_key(address)
            || self.cache.baseline_read().state_by_address.contains_key(address)
    }

    pub fn contains_public_key(&self, public_key: &PublicKey) -> bool {
        self.address_of_key(public_key).is_some()
    }

    /// A copy of the account stored under `address`, if present.
    pub fn get(&self, address: &Address) -> Option<AccountState> {
        if self.removed.contains(address) {
            return None;
        }
        if let Some(state) = self.added.get(address) {
            return Some(state.clone());
        }
        if let Some(state) = self.modified.get(address) {
            return Some(state.clone());
        }
        self.cache.baseline_read().state_by_address.get(address).cloned()
    }

    /// A copy of the account whose public key is `public_key`, if present.
    pub fn get_by_key(&self, public_key: &PublicKey) -> Option<AccountState> {
        let address = self.address_of_key(public_key)?;
        self.get(&address)
    }

    fn address_of_key(&self, public_key: &PublicKey) -> Option<Address> {
        match self.key_overlay.get(public_key) {
            Some(Some(address)) => Some(*address),
            Some(None) => None,
            None => self
                .cache
                .baseline_read()
                .key_to_address
                .get(public_key)
                .copied(),
        }
    }

    fn baseline_contains(&self, address: &Address) -> bool {
        self.cache.baseline_read().state_by_address.contains_key(address)
    }

    // --- mutation ---

    /// A mutable handle to the account stored under `address`, copying a
    /// baseline account into the delta on first write.
    pub fn find_mut(&mut self, address: &Address) -> Option<&mut AccountState> {
        if self.removed.contains(address) {
            return None;
        }
        if self.added.contains_key(address) {
            return self.added.get_mut(address);
        }
        if !self.modified.contains_key(address) {
            let baseline_state = self
                .cache
                .baseline_read()
                .state_by_address
                .get(address)
                .cloned()?;
            self.modified.insert(*address, baseline_state);
        }
        self.modified.get_mut(address)
    }

    /// A mutable handle to the account whose public key is `public_key`.
    pub fn find_by_key_mut(&mut self, public_key: &PublicKey) -> Option<&mut AccountState> {
        let address = self.address_of_key(public_key)?;
        self.find_mut(&address)
    }

    /// Register an account under `address`, observed at `height`. No-op if
    /// the address is already present.
    pub fn add_account_by_address(&mut self, address: &Address, height: Height) {
        if self.contains(address) {
            return;
        }

        let mut state = AccountState::new(*address, height);
        state.balances.optimize(self.options.currency_mosaic_id);
        self.insert_fresh(*address, state);
    }

    /// Register an account by public key, deriving its address, then promote
    /// the stored state with the key once.
    ///
    /// When the account already carries that public key this is observably
    /// idempotent: no copy is made and no dirty mark is set.
    pub fn add_account_by_key(&mut self, public_key: &PublicKey, height: Height) {
        let address = match self.address_of_key(public_key) {
            Some(address) => address,
            None => {
                let address = Address::from_public_key(public_key, self.options.network_id);
                self.key_overlay.insert(*public_key, Some(address));
                address
            }
        };

        self.add_account_by_address(&address, height);

        // fast path: the key is already recorded, so leave no dirty mark
        let already_promoted = self
            .get(&address)
            .map(|state| !state.public_key_height.is_zero())
            .unwrap_or(true);
        if already_promoted {
            return;
        }

        if let Some(state) = self.find_mut(&address) {
            state.public_key = *public_key;
            state.public_key_height = height;
        }
    }

    /// Bulk-insert a fully formed account state, mirroring both indices.
    /// Used by cache loading. No-op if the address is already present.
    pub fn add_account_state(&mut self, mut account_state: AccountState) {
        if self.contains(&account_state.address) {
            return;
        }

        if !account_state.public_key_height.is_zero() {
            self.key_overlay
                .insert(account_state.public_key, Some(account_state.address));
        }

        account_state
            .balances
            .optimize(self.options.currency_mosaic_id);
        self.insert_fresh(account_state.address, account_state);
    }

    fn insert_fresh(&mut self, address: Address, state: AccountState) {
        self.removed.remove(&address);
        if self.baseline_contains(&address) {
            self.modified.insert(address, state);
        } else {
            self.added.insert(address, state);
        }
    }

    /// Remove the account at `address` if its recorded address height
    /// matches `height`; otherwise do nothing.
    pub fn remove_by_address(&mut self, address: &Address, height: Height) {
        let Some(state) = self.get(address) else {
            return;
        };
        if state.address_height != height {
            return;
        }

        // the secondary index only holds accounts with a known public key
        if !state.public_key_height.is_zero() {
            self.key_overlay.insert(state.public_key, None);
        }
        self.forget(address);
    }

    /// Remove the public key recorded at `height`. When the key was observed
    /// at the same height as the address, the whole account is removed;
    /// otherwise only the key is cleared and the address entry remains.
    pub fn remove_by_key(&mut self, public_key: &PublicKey, height: Height) {
        let Some(address) = self.address_of_key(public_key) else {
            return;
        };
        let Some(state) = self.get(&address) else {
            return;
        };
        if state.public_key_height != height {
            return;
        }

        self.key_overlay.insert(state.public_key, None);

        if state.public_key_height == state.address_height {
            self.forget(&address);
            return;
        }

        if let Some(state) = self.find_mut(&address) {
            state.public_key = PublicKey::ZERO;
            state.public_key_height = Height::ZERO;
        }
    }

    fn forget(&mut self, address: &Address) {
        if self.added.remove(address).is_some() {
            return;
        }
        self.modified.remove(address);
        if self.baseline_contains(address) {
            self.removed.insert(*address);
        }
    }

    // --- queued removals ---

    /// Queue an address removal keyed by `(height, address)`.
    pub fn queue_remove_address(&mut self, address: &Address, height: Height) {
        self.queued_remove_by_address.insert((height, *address));
    }

    /// Queue a public-key removal keyed by `(height, key)`.
    pub fn queue_remove_key(&mut self, public_key: &PublicKey, height: Height) {
        self.queued_remove_by_key.insert((height, *public_key));
    }

    /// Cancel a queued address removal.
    pub fn clear_remove_address(&mut self, address: &Address, height: Height) {
        self.queued_remove_by_address.remove(&(height, *address));
    }

    /// Cancel a queued public-key removal.
    pub fn clear_remove_key(&mut self, public_key: &PublicKey, height: Height) {
        self.queued_remove_by_key.remove(&(height, *public_key));
    }

    /// Apply all queued removals, addresses first, then public keys.
    pub fn commit_removals(&mut self) {
        let by_address = mem::take(&mut self.queued_remove_by_address);
        for (height, address) in by_address {
            self.remove_by_address(&address, height);
        }

        let by_key = mem::take(&mut self.queued_remove_by_key);
        for (height, public_key) in by_key {
            self.remove_by_key(&public_key, height);
        }
    }

    // --- high-value accounts ---

    fn run_updater(&self) -> HighValueAccountsUpdater {
        let baseline_high_value = self.cache.baseline_read().high_value.addresses().clone();
        let mut updater = HighValueAccountsUpdater::new(self.options, baseline_high_value);
        updater.update(
            self.added.values().chain(self.modified.values()),
            self.removed.iter(),
        );
        updater
    }

    /// Snapshot of the (current, removed) high-value address sets the
    /// staged changes would produce, without touching the committed
    /// baseline.
    pub fn high_value_addresses(&self) -> (BTreeSet<Address>, BTreeSet<Address>) {
        let updater = self.run_updater();
        (updater.addresses(), updater.removed_addresses())
    }

    /// Transfer the updater's accumulated state to the caller for commit.
    pub fn detach_high_value_accounts(&mut self) -> HighValueAccounts {
        self.run_updater().detach_view()
    }

    // --- terminals ---

    /// Number of accounts visible through the delta.
    pub fn len(&self) -> usize {
        let baseline = self.cache.baseline_read();
        let baseline_visible = baseline
            .state_by_address
            .keys()
            .filter(|address| !self.removed.contains(address))
            .count();
        baseline_visible + self.added.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply every staged change to the committed baseline, replacing the
    /// high-value set with the recomputed one.
    pub fn commit(mut self) {
        let high_value = self.run_updater().detach_view();
        tracing::debug!(
            added = self.added.len(),
            modified = self.modified.len(),
            removed = self.removed.len(),
            high_value = high_value.addresses().len(),
            "committing account state cache delta"
        );

        let added = mem::take(&mut self.added);
        let modified = mem::take(&mut self.modified);
        let removed = mem::take(&mut self.removed);
        let key_overlay = mem::take(&mut self.key_overlay);

        let mut baseline = self
            .cache
            .baseline
            .write()
            .expect("account state cache lock poisoned");

        for address in &removed {
            baseline.state_by_address.remove(address);
        }
        for (address, state) in modified {
            baseline.state_by_address.insert(address, state);
        }
        for (address, state) in added {
            baseline.state_by_address.insert(address, state);
        }
        for (public_key, entry) in key_overlay {
            match entry {
                Some(address) => {
                    baseline.key_to_address.insert(public_key, address);
                }
                None => {
                    baseline.key_to_address.remove(&public_key);
                }
            }
        }
        baseline.high_value = high_value;

        // the delta-open flag is released when `self` drops
    }
}

impl Drop for AccountStateCacheDelta<'_> {
    fn drop(&mut self) {
        self.cache.delta_open.store(false, Ordering::Release);
    }
}

impl ReadOnlyAccountStateCache for AccountStateCacheDelta<'_> {
    fn options(&self) -> &AccountStateCacheOptions {
        &self.options
    }

    fn lookup(&self, address: &Address) -> Option<AccountState> {
        self.get(address)
    }

    fn lookup_by_key(&self, public_key: &PublicKey) -> Option<AccountState> {
        self.get_by_key(public_key)
    }
}
