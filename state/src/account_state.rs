//! Per-account chain state.

use crate::balance_history::BalanceHistory;
use crate::balances::AccountBalances;
use crate::importance::ImportanceSnapshots;
use ember_types::{Address, Height, PublicKey};
use serde::{Deserialize, Serialize};

/// How an account participates in remote harvesting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Not linked to any other account.
    #[default]
    Unlinked,
    /// A main account that delegated harvesting to a remote account.
    Main,
    /// A remote account harvesting on behalf of a main account.
    Remote,
}

/// The full state of one account.
///
/// Created by the cache delta on first mention and destroyed when purged at
/// its address height. All mutation flows through the delta.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// The account address.
    pub address: Address,
    /// Height at which the address was first observed.
    pub address_height: Height,

    /// The account public key, zero until revealed by a signed entity.
    pub public_key: PublicKey,
    /// Height at which the public key was first observed; zero when the key
    /// is unknown.
    pub public_key_height: Height,

    pub account_type: AccountType,
    /// Public key of the linked counterpart account (main ↔ remote).
    pub linked_public_key: Option<PublicKey>,

    pub balances: AccountBalances,
    pub importance_snapshots: ImportanceSnapshots,
    /// Height-keyed history of the harvesting-mosaic balance, maintained by
    /// the observers that track harvester eligibility and pruned as blocks
    /// fall out of the rollback window.
    pub balance_history: BalanceHistory,
}

impl AccountState {
    /// Create a fresh account state observed at `address_height`.
    pub fn new(address: Address, address_height: Height) -> Self {
        Self {
            address,
            address_height,
            ..Self::default()
        }
    }

    /// Whether the account's public key is known.
    pub fn has_public_key(&self) -> bool {
        !self.public_key_height.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_is_unlinked_with_unknown_key() {
        let address = Address::new([3u8; 20]);
        let state = AccountState::new(address, Height::new(7));

        assert_eq!(address, state.address);
        assert_eq!(Height::new(7), state.address_height);
        assert_eq!(AccountType::Unlinked, state.account_type);
        assert!(!state.has_public_key());
        assert!(state.linked_public_key.is_none());
        assert!(state.balances.is_empty());
        assert!(state.importance_snapshots.is_empty());
        assert_eq!(0, state.balance_history.size());
    }

    #[test]
    fn has_public_key_follows_key_height() {
        let mut state = AccountState::new(Address::new([3u8; 20]), Height::new(7));
        state.public_key = PublicKey::new([9u8; 32]);
        state.public_key_height = Height::new(8);
        assert!(state.has_public_key());
    }
}
