//! Height-keyed balance history for a single mosaic.

use ember_types::{Amount, Height};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Balance values keyed by the height at which they took effect.
///
/// `balance(h)` answers "what was the balance as of height h": the value
/// recorded at the largest height not above `h`. Pruning at `h` collapses
/// everything at or below `h` into a single entry at `h`, leaving every
/// lookup at or above `h` unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceHistory {
    height_balance_map: BTreeMap<Height, Amount>,
}

impl BalanceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> usize {
        self.height_balance_map.len()
    }

    /// The most recently recorded balance, zero if the history is empty.
    pub fn balance(&self) -> Amount {
        self.height_balance_map
            .last_key_value()
            .map(|(_, amount)| *amount)
            .unwrap_or(Amount::ZERO)
    }

    /// The balance in effect at `height`, zero if nothing was recorded at or
    /// below it.
    pub fn balance_at(&self, height: Height) -> Amount {
        self.height_balance_map
            .range(..=height)
            .next_back()
            .map(|(_, amount)| *amount)
            .unwrap_or(Amount::ZERO)
    }

    /// Whether any recorded balance is at least `amount`.
    pub fn any_at_least(&self, amount: Amount) -> bool {
        self.height_balance_map.values().any(|&value| amount <= value)
    }

    /// Record `balance` as taking effect at `height`.
    pub fn add(&mut self, height: Height, balance: Amount) {
        self.height_balance_map.insert(height, balance);
    }

    /// Collapse all entries at or below `height` into one entry at `height`
    /// holding the balance in effect there. No-op when nothing is recorded
    /// at or below `height`.
    pub fn prune(&mut self, height: Height) {
        let Some(balance_at_prune_height) = self
            .height_balance_map
            .range(..=height)
            .next_back()
            .map(|(_, amount)| *amount)
        else {
            return;
        };

        self.height_balance_map = self.height_balance_map.split_off(&(height + 1));
        self.add(height, balance_at_prune_height);
    }
}
