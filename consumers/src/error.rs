use crate::handlers::ValidationResult;
use thiserror::Error;

/// Deterministic rejection of a candidate chain. The input is discarded and
/// the caller may log and resume; no state was mutated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncAbort {
    /// The candidate's height range cannot attach to the local chain, or
    /// its source is not allowed to rewrite stored history.
    RemoteChainUnlinked,
    /// A candidate block's difficulty does not match the locally computed
    /// value for its height.
    MismatchedDifficulties,
    /// The candidate chain does not strictly improve the chain score.
    ScoreNotBetter,
    /// The processor rejected the candidate; the code is propagated
    /// verbatim.
    Processor(ValidationResult),
}

/// Fatal failure during a sync. The node must not continue processing
/// chains after one of these surfaces.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("cache failure during sync: {0}")]
    Cache(#[from] ember_cache::CacheError),

    #[error("storage failure during sync: {0}")]
    Store(#[from] ember_store::StoreError),
}
