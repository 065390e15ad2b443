//! Account address type and derivation.
//!
//! An address is 20 bytes derived from the account public key via
//! Blake2b-256 over the network byte followed by the key bytes, truncated.
//! The network byte makes addresses from different networks incompatible.

use crate::keys::PublicKey;
use crate::network::NetworkId;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;

type Blake2b256 = Blake2b<U32>;

/// A 20-byte account address.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive the address of a public key on the given network.
    pub fn from_public_key(public_key: &PublicKey, network_id: NetworkId) -> Self {
        let mut hasher = Blake2b256::new();
        hasher.update([network_id.byte()]);
        hasher.update(public_key.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(")?;
        for b in &self.0[..4] {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let key = PublicKey::new([7u8; 32]);
        let a1 = Address::from_public_key(&key, NetworkId::Live);
        let a2 = Address::from_public_key(&key, NetworkId::Live);
        assert_eq!(a1, a2);
        assert!(!a1.is_zero());
    }

    #[test]
    fn derivation_depends_on_network() {
        let key = PublicKey::new([7u8; 32]);
        let live = Address::from_public_key(&key, NetworkId::Live);
        let test = Address::from_public_key(&key, NetworkId::Test);
        assert_ne!(live, test);
    }

    #[test]
    fn derivation_depends_on_key() {
        let a = Address::from_public_key(&PublicKey::new([1u8; 32]), NetworkId::Dev);
        let b = Address::from_public_key(&PublicKey::new([2u8; 32]), NetworkId::Dev);
        assert_ne!(a, b);
    }
}
