//! Funds-lock state.

use crate::error::StateError;
use ember_types::{Address, Amount, Height, MosaicId};
use serde::{Deserialize, Serialize};

/// Lifecycle of a lock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockStatus {
    /// Lock is open and can still be used or expire.
    #[default]
    Active,
    /// Lock was consumed by its secret/proof before expiry.
    Used,
    /// Lock expired; funds returned to the owner.
    Expired,
}

/// Funds locked by an account until an expiry height.
///
/// Inserted by lock transactions; the expiry observer resolves it exactly
/// once at its expiry height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    pub owner: Address,
    pub mosaic_id: MosaicId,
    pub amount: Amount,
    pub expiry_height: Height,
    pub status: LockStatus,
}

impl LockInfo {
    pub fn new(owner: Address, mosaic_id: MosaicId, amount: Amount, expiry_height: Height) -> Self {
        Self {
            owner,
            mosaic_id,
            amount,
            expiry_height,
            status: LockStatus::Active,
        }
    }

    /// Whether the lock is still usable at `height`.
    pub fn is_active(&self, height: Height) -> bool {
        self.status == LockStatus::Active && height < self.expiry_height
    }

    /// Mark the lock used. Fails if it was already resolved.
    pub fn mark_used(&mut self) -> Result<(), StateError> {
        if self.status != LockStatus::Active {
            return Err(StateError::LockAlreadyResolved);
        }
        self.status = LockStatus::Used;
        Ok(())
    }

    /// Mark the lock expired. Fails if it was already resolved; the expiry
    /// observer must fire exactly once per lock.
    pub fn expire(&mut self) -> Result<(), StateError> {
        if self.status != LockStatus::Active {
            return Err(StateError::LockAlreadyResolved);
        }
        self.status = LockStatus::Expired;
        Ok(())
    }
}
