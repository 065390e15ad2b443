//! Chain synchronization.
//!
//! The sync consumer takes a candidate suffix of blocks proposed by a peer,
//! decides whether it is acceptable, and atomically replaces the locally
//! stored chain suffix with it — or leaves every byte of state untouched.

pub mod error;
pub mod handlers;
pub mod input;
pub mod sync;

pub use error::{SyncAbort, SyncError};
pub use handlers::{
    BlockChainSyncHandlers, ChainState, ObserverState, ParentBlockInfo, StateChangeInfo,
    TransactionsChangeInfo, ValidationResult,
};
pub use input::{ConsumerInput, InputSource};
pub use sync::{BlockChainSyncConsumer, SyncResult};
