//! Chain score arithmetic.
//!
//! The score of a chain part is the sum of its block difficulties. Chains
//! are ordered by score; the sync consumer accepts a candidate only when its
//! score strictly exceeds the score of the blocks it replaces.

use crate::difficulty::Difficulty;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Accumulated difficulty of a sequence of blocks.
///
/// Stored as u128 so that summing u64 difficulties over an entire chain
/// cannot overflow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainScore(u128);

impl ChainScore {
    pub const ZERO: Self = Self(0);

    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    /// Score contribution of a single block.
    ///
    /// A block contributes its difficulty minus one, so that a run of
    /// minimum-difficulty blocks still orders longer chains above shorter
    /// ones without letting zero-work blocks inflate the score.
    pub fn block_component(difficulty: Difficulty) -> Self {
        Self(u128::from(difficulty.raw().saturating_sub(1)))
    }

    /// Sum the score of an iterator of block difficulties.
    pub fn from_difficulties<I: IntoIterator<Item = Difficulty>>(difficulties: I) -> Self {
        difficulties
            .into_iter()
            .fold(Self::ZERO, |acc, d| acc + Self::block_component(d))
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }
}

impl Add for ChainScore {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for ChainScore {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl fmt::Display for ChainScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
