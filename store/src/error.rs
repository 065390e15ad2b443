use ember_types::Height;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no block stored at height {0}")]
    NotFound(Height),

    #[error("cannot save block at height {requested}: chain height is {chain_height}")]
    HeightGap {
        chain_height: Height,
        requested: Height,
    },

    #[error("cannot drop blocks after {0}: the nemesis block is immutable")]
    NemesisImmutable(Height),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
