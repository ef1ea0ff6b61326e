//! SSZ `boolean`

use super::{BasicKind, BasicType};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A boolean, encoded as a single 0x00 or 0x01 byte.
///
/// Booleans carry no arithmetic; use the wrapped `bool` for logic.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Boolean(pub bool);

impl Boolean {
    pub const fn new(value: bool) -> Self {
        Boolean(value)
    }

    pub const fn get(self) -> bool {
        self.0
    }

    /// Only 0 and 1 are booleans
    pub fn from_i128(value: i128) -> Result<Self> {
        match value {
            0 => Ok(Boolean(false)),
            1 => Ok(Boolean(true)),
            _ => Err(Error::ValueOutOfRange(format!(
                "{} is not a boolean",
                value
            ))),
        }
    }
}

impl From<bool> for Boolean {
    fn from(value: bool) -> Self {
        Boolean(value)
    }
}

impl From<Boolean> for bool {
    fn from(value: Boolean) -> Self {
        value.0
    }
}

impl TryFrom<u8> for Boolean {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Boolean::from_i128(i128::from(value))
    }
}

impl BasicType for Boolean {
    const KIND: BasicKind = BasicKind::Boolean;

    fn write_le(&self, out: &mut [u8]) {
        out[0] = u8::from(self.0);
    }

    fn from_le(bytes: &[u8]) -> Result<Self> {
        match bytes {
            [0] => Ok(Boolean(false)),
            [1] => Ok(Boolean(true)),
            [b] => Err(Error::decode(format!("invalid boolean byte {:#04x}", b))),
            _ => Err(Error::decode(format!(
                "boolean needs 1 byte, got {}",
                bytes.len()
            ))),
        }
    }
}

impl fmt::Display for Boolean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Boolean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Boolean({})", self.0)
    }
}
