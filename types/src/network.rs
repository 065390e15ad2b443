//! Network identifier.

use serde::{Deserialize, Serialize};

/// Identifies which ember network an entity belongs to.
///
/// The discriminant byte participates in address derivation and entity
/// validation, so entities cannot cross networks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkId {
    /// The production network.
    Live,
    /// The public test network.
    Test,
    /// Local development network.
    Dev,
}

impl NetworkId {
    /// The discriminant byte mixed into address derivation.
    pub fn byte(&self) -> u8 {
        match self {
            Self::Live => 0x68,
            Self::Test => 0x98,
            Self::Dev => 0xa8,
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Test => "test",
            Self::Dev => "dev",
        }
    }
}
