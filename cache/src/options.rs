//! Immutable account-state cache configuration.

use ember_types::{Amount, MosaicId, NetworkId};

/// Network parameters fixed for the lifetime of an account-state cache.
#[derive(Clone, Copy, Debug)]
pub struct AccountStateCacheOptions {
    pub network_id: NetworkId,
    /// Block interval between importance recalculations.
    pub importance_grouping: u64,
    /// Minimum harvesting-mosaic balance of an eligible harvester.
    pub min_harvester_balance: Amount,
    /// Maximum harvesting-mosaic balance of an eligible harvester.
    pub max_harvester_balance: Amount,
    /// The mosaic whose balance gates harvesting eligibility.
    pub harvesting_mosaic_id: MosaicId,
    /// The network currency; pre-registered in every account's balances.
    pub currency_mosaic_id: MosaicId,
}
