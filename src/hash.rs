//! 32-byte Merkle roots and the pair hash function

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte SHA-256 digest: the content of a leaf, or the root of a subtree
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Root([u8; 32]);

impl Root {
    /// The all-zero chunk, root of every depth-0 zero subtree
    pub const ZERO: Root = Root([0u8; 32]);

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Root(bytes)
    }

    /// Build a root from at most 32 bytes, zero-padding on the right
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        if data.len() > 32 {
            return Err(Error::decode(format!(
                "chunk of {} bytes is longer than 32",
                data.len()
            )));
        }
        let mut arr = [0u8; 32];
        arr[..data.len()].copy_from_slice(data);
        Ok(Root(arr))
    }

    /// Hash two child roots into their parent root
    pub fn combine(left: &Root, right: &Root) -> Root {
        let mut hasher = Sha256::new();
        hasher.update(left.0);
        hasher.update(right.0);
        Root(hasher.finalize().into())
    }

    /// A little-endian length value, as used by list length mix-ins
    pub fn from_length(length: u64) -> Root {
        let mut arr = [0u8; 32];
        arr[..8].copy_from_slice(&length.to_le_bytes());
        Root(arr)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to a `0x`-prefixed hex string
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex, with or without the `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))?;
        if bytes.len() != 32 {
            return Err(Error::InvalidHex(hex::FromHexError::InvalidStringLength));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Root(arr))
    }

    /// Get a short prefix for display
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Root({})", self.short())
    }
}

impl Default for Root {
    fn default() -> Self {
        Root::ZERO
    }
}

impl AsRef<[u8]> for Root {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Root {
    fn from(bytes: [u8; 32]) -> Self {
        Root(bytes)
    }
}

impl Serialize for Root {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Root {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Root::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
