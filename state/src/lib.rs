//! Account state primitives.
//!
//! The types in this crate are owned by the account-state cache and mutated
//! only through its delta. They carry no locking of their own.

pub mod account_state;
pub mod balance_history;
pub mod balances;
pub mod error;
pub mod importance;
pub mod lock_info;

pub use account_state::{AccountState, AccountType};
pub use balance_history::BalanceHistory;
pub use balances::AccountBalances;
pub use error::StateError;
pub use importance::ImportanceSnapshots;
pub use lock_info::{LockInfo, LockStatus};
