//! Read-only importance resolution over the account-state cache.

use crate::account_cache::ReadOnlyAccountStateCache;
use crate::error::CacheError;
use ember_state::{AccountState, AccountType};
use ember_types::{Address, Height, Importance, ImportanceHeight};

/// Verify that `remote` and `main` form a well-linked remote/main pair.
///
/// This only fires when a bug has corrupted links; a failure is fatal to the
/// caller.
pub fn require_linked_remote_and_main(
    remote: &AccountState,
    main: &AccountState,
) -> Result<(), CacheError> {
    if main.account_type != AccountType::Main {
        return Err(CacheError::CorruptedLink {
            remote: remote.address,
            reason: "linked account is not a main account",
        });
    }

    if main.linked_public_key != Some(remote.public_key) {
        return Err(CacheError::CorruptedLink {
            remote: remote.address,
            reason: "main account does not link back to the remote key",
        });
    }

    Ok(())
}

/// Answers "does this account have importance at this height" and "may it
/// harvest here", forwarding remote accounts to their main account.
pub struct ImportanceView<'a> {
    cache: &'a dyn ReadOnlyAccountStateCache,
}

impl<'a> ImportanceView<'a> {
    pub fn new(cache: &'a dyn ReadOnlyAccountStateCache) -> Self {
        Self { cache }
    }

    /// Resolve `address` to the account whose importance applies: the
    /// account itself, or its main account when it is a remote.
    fn find_forwarded(&self, address: &Address) -> Result<Option<AccountState>, CacheError> {
        let Some(account) = self.cache.lookup(address) else {
            return Ok(None);
        };

        if account.account_type != AccountType::Remote {
            return Ok(Some(account));
        }

        let linked_key = account
            .linked_public_key
            .ok_or(CacheError::MissingLink(account.address))?;
        let main = self
            .cache
            .lookup_by_key(&linked_key)
            .ok_or(CacheError::MissingMainAccount(account.address))?;

        require_linked_remote_and_main(&account, &main)?;
        Ok(Some(main))
    }

    fn with_importance_at_height<T>(
        &self,
        address: &Address,
        height: Height,
        action: impl FnOnce(&AccountState) -> T,
    ) -> Result<Option<T>, CacheError> {
        let Some(account) = self.find_forwarded(address)? else {
            return Ok(None);
        };

        let importance_height =
            ImportanceHeight::from_height(height, self.cache.options().importance_grouping);
        if account.importance_snapshots.height() != importance_height {
            return Ok(None);
        }

        Ok(Some(action(&account)))
    }

    /// The account's importance at `height`, `None` when the account is
    /// absent or its snapshot does not cover the height.
    pub fn try_get_account_importance(
        &self,
        address: &Address,
        height: Height,
    ) -> Result<Option<Importance>, CacheError> {
        self.with_importance_at_height(address, height, |account| {
            account.importance_snapshots.current()
        })
    }

    /// The account's importance at `height`, zero when unavailable.
    pub fn get_account_importance_or_default(
        &self,
        address: &Address,
        height: Height,
    ) -> Result<Importance, CacheError> {
        Ok(self
            .try_get_account_importance(address, height)?
            .unwrap_or(Importance::ZERO))
    }

    /// Whether the account may harvest a block at `height`: non-zero current
    /// importance and a harvesting-mosaic balance inside the configured
    /// window.
    pub fn can_harvest(&self, address: &Address, height: Height) -> Result<bool, CacheError> {
        let options = *self.cache.options();
        let eligible = self.with_importance_at_height(address, height, |account| {
            if account.importance_snapshots.current().is_zero() {
                return false;
            }

            let balance = account.balances.get(options.harvesting_mosaic_id);
            options.min_harvester_balance <= balance && balance <= options.max_harvester_balance
        })?;

        Ok(eligible.unwrap_or(false))
    }
}
