//! Block height and importance-height types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// A block height. Height 1 is the nemesis block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Height(u64);

impl Height {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl Add<u64> for Height {
    type Output = Self;
    fn add(self, rhs: u64) -> Self {
        Self(self.0 + rhs)
    }
}

impl Sub<u64> for Height {
    type Output = Self;
    fn sub(self, rhs: u64) -> Self {
        Self(self.0 - rhs)
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The height at which an importance recalculation took effect.
///
/// A block height `h` maps onto the importance height `h - (h % grouping)`,
/// where `grouping` is the fixed recalculation interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImportanceHeight(u64);

impl ImportanceHeight {
    pub const ZERO: Self = Self(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Convert a block height to its importance height under `grouping`.
    ///
    /// # Panics
    /// Panics if `grouping` is zero; the grouping is a fixed network
    /// parameter validated at configuration load.
    pub fn from_height(height: Height, grouping: u64) -> Self {
        assert!(grouping > 0, "importance grouping must be non-zero");
        let raw = height.raw();
        Self(raw - raw % grouping)
    }
}

impl fmt::Display for ImportanceHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An account importance value at a recalculation point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Importance(u64);

impl Importance {
    pub const ZERO: Self = Self(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn importance_height_rounds_down_to_grouping_multiple() {
        assert_eq!(
            ImportanceHeight::new(0),
            ImportanceHeight::from_height(Height::new(0), 50)
        );
        assert_eq!(
            ImportanceHeight::new(0),
            ImportanceHeight::from_height(Height::new(49), 50)
        );
        assert_eq!(
            ImportanceHeight::new(50),
            ImportanceHeight::from_height(Height::new(50), 50)
        );
        assert_eq!(
            ImportanceHeight::new(50),
            ImportanceHeight::from_height(Height::new(99), 50)
        );
        assert_eq!(
            ImportanceHeight::new(100),
            ImportanceHeight::from_height(Height::new(100), 50)
        );
    }

    #[test]
    fn importance_height_identity_with_grouping_one() {
        for raw in [0u64, 1, 7, 1000] {
            assert_eq!(
                ImportanceHeight::new(raw),
                ImportanceHeight::from_height(Height::new(raw), 1)
            );
        }
    }

    #[test]
    #[should_panic(expected = "importance grouping must be non-zero")]
    fn importance_height_rejects_zero_grouping() {
        let _ = ImportanceHeight::from_height(Height::new(10), 0);
    }

    #[test]
    fn height_arithmetic() {
        assert_eq!(Height::new(8), Height::new(7) + 1);
        assert_eq!(Height::new(6), Height::new(7) - 1);
        assert_eq!(Height::ZERO, Height::new(3).saturating_sub(Height::new(7)));
    }
}
