//! The account-state cache and its read-only view.

use crate::delta::AccountStateCacheDelta;
use crate::error::CacheError;
use crate::high_value::HighValueAccounts;
use crate::options::AccountStateCacheOptions;
use ember_state::AccountState;
use ember_types::{Address, PublicKey};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard};

/// The committed cache contents.
#[derive(Default)]
pub(crate) struct Baseline {
    pub(crate) state_by_address: HashMap<Address, AccountState>,
    pub(crate) key_to_address: HashMap<PublicKey, Address>,
    pub(crate) high_value: HighValueAccounts,
}

/// Read access shared by views and deltas, used by [`crate::ImportanceView`].
///
/// Lookups return owned state so that implementors backed by overlay maps or
/// lock guards expose the same shape.
pub trait ReadOnlyAccountStateCache {
    fn options(&self) -> &AccountStateCacheOptions;

    /// The account stored under `address`, if any.
    fn lookup(&self, address: &Address) -> Option<AccountState>;

    /// The account whose public key is `public_key`, resolved through the
    /// secondary index.
    fn lookup_by_key(&self, public_key: &PublicKey) -> Option<AccountState>;
}

/// Process-wide cache of account states.
///
/// Any number of read-only views may exist concurrently; at most one delta
/// may be open at a time, and all mutation flows through it.
pub struct AccountStateCache {
    options: AccountStateCacheOptions,
    pub(crate) baseline: RwLock<Baseline>,
    pub(crate) delta_open: AtomicBool,
}

impl AccountStateCache {
    pub fn new(options: AccountStateCacheOptions) -> Self {
        Self {
            options,
            baseline: RwLock::new(Baseline::default()),
            delta_open: AtomicBool::new(false),
        }
    }

    pub fn options(&self) -> &AccountStateCacheOptions {
        &self.options
    }

    pub(crate) fn baseline_read(&self) -> RwLockReadGuard<'_, Baseline> {
        self.baseline.read().expect("account state cache lock poisoned")
    }

    /// Open a read-only view over the committed contents.
    pub fn view(&self) -> AccountStateCacheView<'_> {
        AccountStateCacheView {
            guard: self.baseline_read(),
            options: &self.options,
        }
    }

    /// Open the cache's single write delta.
    ///
    /// Fails with [`CacheError::DeltaAlreadyOpen`] while another delta is
    /// live; opening a second delta is a programming error.
    pub fn delta(&self) -> Result<AccountStateCacheDelta<'_>, CacheError> {
        if self
            .delta_open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CacheError::DeltaAlreadyOpen);
        }

        Ok(AccountStateCacheDelta::new(self))
    }
}

/// A read-only snapshot view of the committed cache contents.
pub struct AccountStateCacheView<'a> {
    guard: RwLockReadGuard<'a, Baseline>,
    options: &'a AccountStateCacheOptions,
}

impl AccountStateCacheView<'_> {
    pub fn len(&self) -> usize {
        self.guard.state_by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.state_by_address.is_empty()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.guard.state_by_address.contains_key(address)
    }

    pub fn contains_key(&self, public_key: &PublicKey) -> bool {
        self.guard.key_to_address.contains_key(public_key)
    }

    pub fn get(&self, address: &Address) -> Option<&AccountState> {
        self.guard.state_by_address.get(address)
    }

    pub fn get_by_key(&self, public_key: &PublicKey) -> Option<&AccountState> {
        let address = self.guard.key_to_address.get(public_key)?;
        self.guard.state_by_address.get(address)
    }

    /// The committed high-value address set.
    pub fn high_value_addresses(&self) -> &BTreeSet<Address> {
        self.guard.high_value.addresses()
    }
}

impl ReadOnlyAccountStateCache for AccountStateCacheView<'_> {
    fn options(&self) -> &AccountStateCacheOptions {
        self.options
    }

    fn lookup(&self, address: &Address) -> Option<AccountState> {
        self.get(address).cloned()
    }

    fn lookup_by_key(&self, public_key: &PublicKey) -> Option<AccountState> {
        self.get_by_key(public_key).cloned()
    }
}
