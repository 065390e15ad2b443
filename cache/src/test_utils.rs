//! Shared fixtures for cache tests.

use crate::options::AccountStateCacheOptions;
use ember_types::{Amount, MosaicId, NetworkId};

pub(crate) const HARVESTING_MOSAIC: MosaicId = MosaicId::new(9876);
pub(crate) const CURRENCY_MOSAIC: MosaicId = MosaicId::new(1234);

pub(crate) fn test_options() -> AccountStateCacheOptions {
    AccountStateCacheOptions {
        network_id: NetworkId::Test,
        importance_grouping: 50,
        min_harvester_balance: Amount::new(1_000),
        max_harvester_balance: Amount::new(100_000),
        harvesting_mosaic_id: HARVESTING_MOSAIC,
        currency_mosaic_id: CURRENCY_MOSAIC,
    }
}
