use ember_types::{Amount, MosaicId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("cannot debit {amount} of mosaic {mosaic_id}: balance is {balance}")]
    BalanceUnderflow {
        mosaic_id: MosaicId,
        balance: Amount,
        amount: Amount,
    },

    #[error("balance credit overflowed for mosaic {0}")]
    BalanceOverflow(MosaicId),

    #[error("lock was already resolved")]
    LockAlreadyResolved,
}
