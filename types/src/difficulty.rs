//! Per-block difficulty.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The difficulty recorded in a block header.
///
/// A freshly initialized chain starts every block at [`Difficulty::BASE`];
/// the difficulty checker recomputes the expected value per height from the
/// sliding window of recent blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Difficulty(u64);

impl Difficulty {
    /// The initial (minimum) difficulty, 10^14.
    pub const BASE: Self = Self(100_000_000_000_000);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::BASE
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
