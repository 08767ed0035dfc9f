// crates/strata-core/src/identity.rs
//
// Account and consensus identities.
//
// An `Address` is an opaque, byte-comparable 20-byte identifier. The same
// bytes identify an account when it delegates and a validator when it
// operates, so "the validator's own operator-as-delegator identity" is simply
// the operator address compared as a delegator.
//
// A validator also carries a consensus public key. Its `ConsAddress` (the first
// 20 bytes of SHA-256 over the key) is what the external consensus engine uses
// to look the validator up.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::StrataError;

/// Length in bytes of every account and consensus address.
pub const ADDRESS_LEN: usize = 20;

/// Account / operator identity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// Build an address from a raw byte slice.
    ///
    /// # Errors
    /// Returns `StrataError::InvalidState` if the slice is not exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, StrataError> {
        let raw: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| {
            StrataError::InvalidState(format!(
                "address must be {} bytes, got {}",
                ADDRESS_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| StrataError::Serialization(format!("invalid address hex '{}': {}", s, e)))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Address the consensus engine knows a validator by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConsAddress(pub Address);

/// Consensus public key bytes. The key type is opaque to this engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConsensusPubKey(pub Vec<u8>);

impl ConsensusPubKey {
    /// Derive the consensus address: SHA-256 of the key, truncated to 20 bytes.
    pub fn address(&self) -> ConsAddress {
        let digest = Sha256::digest(&self.0);
        let mut raw = [0u8; ADDRESS_LEN];
        raw.copy_from_slice(&digest[..ADDRESS_LEN]);
        ConsAddress(Address(raw))
    }
}

impl Serialize for ConsensusPubKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for ConsensusPubKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s)
            .map(ConsensusPubKey)
            .map_err(serde::de::Error::custom)
    }
}
