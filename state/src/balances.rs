//! Per-account mosaic balances.

use crate::error::StateError;
use ember_types::{Amount, MosaicId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mosaic balances owned by a single account.
///
/// One mosaic id (the network currency) can be registered as the optimized
/// slot; it is pre-created on account creation so the hot fee-debit path
/// never inserts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalances {
    optimized_mosaic_id: Option<MosaicId>,
    balances: BTreeMap<MosaicId, Amount>,
}

impl AccountBalances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `mosaic_id` as the optimized slot, creating a zero entry.
    pub fn optimize(&mut self, mosaic_id: MosaicId) {
        self.optimized_mosaic_id = Some(mosaic_id);
        self.balances.entry(mosaic_id).or_insert(Amount::ZERO);
    }

    pub fn optimized_mosaic_id(&self) -> Option<MosaicId> {
        self.optimized_mosaic_id
    }

    /// Balance of `mosaic_id`, zero if the mosaic was never credited.
    pub fn get(&self, mosaic_id: MosaicId) -> Amount {
        self.balances.get(&mosaic_id).copied().unwrap_or(Amount::ZERO)
    }

    pub fn credit(&mut self, mosaic_id: MosaicId, amount: Amount) -> Result<(), StateError> {
        if amount.is_zero() {
            return Ok(());
        }

        let entry = self.balances.entry(mosaic_id).or_insert(Amount::ZERO);
        *entry = entry
            .checked_add(amount)
            .ok_or(StateError::BalanceOverflow(mosaic_id))?;
        Ok(())
    }

    pub fn debit(&mut self, mosaic_id: MosaicId, amount: Amount) -> Result<(), StateError> {
        if amount.is_zero() {
            return Ok(());
        }

        let balance = self.get(mosaic_id);
        let remaining = balance
            .checked_sub(amount)
            .ok_or(StateError::BalanceUnderflow {
                mosaic_id,
                balance,
                amount,
            })?;

        if remaining.is_zero() && Some(mosaic_id) != self.optimized_mosaic_id {
            self.balances.remove(&mosaic_id);
        } else {
            self.balances.insert(mosaic_id, remaining);
        }
        Ok(())
    }

    /// Number of mosaics with a stored entry.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MosaicId, &Amount)> {
        self.balances.iter()
    }
}
