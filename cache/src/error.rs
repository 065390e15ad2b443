use ember_types::{Address, Height};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("a delta is already open on this cache")]
    DeltaAlreadyOpen,

    #[error("remote account {0} has no linked public key")]
    MissingLink(Address),

    #[error("main account linked from remote {0} is not present")]
    MissingMainAccount(Address),

    #[error("account link between {remote} and its main account is corrupted: {reason}")]
    CorruptedLink { remote: Address, reason: &'static str },

    #[error("difficulty info at height {actual} is not contiguous with chain tip {expected}")]
    NonContiguousDifficulty { expected: Height, actual: Height },

    #[error("only the tip difficulty info (height {tip}) can be removed, not {requested}")]
    NotDifficultyTip { tip: Height, requested: Height },

    #[error(transparent)]
    State(#[from] ember_state::StateError),
}
