//! Fundamental types for the ember chain-sync core.
//!
//! This crate defines the value types shared across every other crate in the
//! workspace: heights, amounts, difficulties, hashes, keys, addresses, and
//! the chain score.

pub mod address;
pub mod amount;
pub mod difficulty;
pub mod hash;
pub mod height;
pub mod keys;
pub mod mosaic;
pub mod network;
pub mod score;
pub mod time;

pub use address::Address;
pub use amount::Amount;
pub use difficulty::Difficulty;
pub use hash::Hash256;
pub use height::{Height, Importance, ImportanceHeight};
pub use keys::{PublicKey, Signature};
pub use mosaic::MosaicId;
pub use network::NetworkId;
pub use score::ChainScore;
pub use time::Timestamp;
