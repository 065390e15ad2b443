//! High-value (harvester-eligible) account tracking.

use crate::options::AccountStateCacheOptions;
use ember_state::AccountState;
use ember_types::Address;
use std::collections::BTreeSet;

/// The committed set of addresses whose harvesting-mosaic balance lies in
/// the harvester window.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighValueAccounts {
    addresses: BTreeSet<Address>,
}

impl HighValueAccounts {
    pub fn new(addresses: BTreeSet<Address>) -> Self {
        Self { addresses }
    }

    pub fn addresses(&self) -> &BTreeSet<Address> {
        &self.addresses
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }
}

/// Incrementally recomputes the high-value set from a delta's added,
/// modified and removed account sets.
pub struct HighValueAccountsUpdater {
    options: AccountStateCacheOptions,
    baseline: BTreeSet<Address>,
    current_adds: BTreeSet<Address>,
    removed_adds: BTreeSet<Address>,
}

impl HighValueAccountsUpdater {
    pub fn new(options: AccountStateCacheOptions, baseline: BTreeSet<Address>) -> Self {
        Self {
            options,
            baseline,
            current_adds: BTreeSet::new(),
            removed_adds: BTreeSet::new(),
        }
    }

    fn passes_window(&self, account: &AccountState) -> bool {
        let balance = account.balances.get(self.options.harvesting_mosaic_id);
        self.options.min_harvester_balance <= balance
            && balance <= self.options.max_harvester_balance
    }

    /// Fold a delta's account sets into the updater.
    ///
    /// An address that is both modified and passing ends in the current
    /// set — passing always wins over an earlier rejection.
    pub fn update<'a>(
        &mut self,
        added_or_modified: impl IntoIterator<Item = &'a AccountState>,
        removed: impl IntoIterator<Item = &'a Address>,
    ) {
        for account in added_or_modified {
            if self.passes_window(account) {
                self.current_adds.insert(account.address);
                self.removed_adds.remove(&account.address);
            } else {
                self.removed_adds.insert(account.address);
                self.current_adds.remove(&account.address);
            }
        }

        for address in removed {
            self.removed_adds.insert(*address);
            self.current_adds.remove(address);
        }
    }

    /// Current = (baseline ∪ currentAdds) \ removedAdds.
    pub fn addresses(&self) -> BTreeSet<Address> {
        self.baseline
            .union(&self.current_adds)
            .filter(|address| !self.removed_adds.contains(*address))
            .copied()
            .collect()
    }

    /// Removed = baseline ∩ removedAdds.
    pub fn removed_addresses(&self) -> BTreeSet<Address> {
        self.baseline
            .intersection(&self.removed_adds)
            .copied()
            .collect()
    }

    /// Transfer the accumulated state out for commit.
    pub fn detach_view(self) -> HighValueAccounts {
        HighValueAccounts::new(self.addresses())
    }
}
