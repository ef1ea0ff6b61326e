//! Fixed-width unsigned integers: uint8 through uint256
//!
//! Arithmetic is defined only between values of the same width and fails
//! instead of wrapping. Bitwise operators and shifts go through `std::ops`;
//! left shifts clip to the width.

use super::{BasicKind, BasicType};
use crate::{Error, Result};
use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not, Shl, Shr};

/// Checked arithmetic over same-width unsigned integers
pub trait SafeArith:
    Sized
    + Copy
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
{
    /// Safe variant of `+` that fails on overflow
    fn safe_add(self, rhs: Self) -> Result<Self>;

    /// Safe variant of `-` that fails on underflow
    fn safe_sub(self, rhs: Self) -> Result<Self>;

    /// Safe variant of `*` that fails on overflow
    fn safe_mul(self, rhs: Self) -> Result<Self>;

    /// Floor division; fails on division by zero
    fn safe_div(self, rhs: Self) -> Result<Self>;

    /// Safe variant of `%` that fails on division by zero
    fn safe_rem(self, rhs: Self) -> Result<Self>;

    /// Exponentiation that fails on overflow
    fn safe_pow(self, exp: Self) -> Result<Self>;
}

fn out_of_range(type_name: &str, op: &str) -> Error {
    Error::ValueOutOfRange(format!("{} {} result does not fit the type", type_name, op))
}

fn division_by_zero(type_name: &str) -> Error {
    Error::ValueOutOfRange(format!("{} division by zero", type_name))
}

macro_rules! define_uint {
    ($name:ident, $native:ty, $kind:ident) => {
        #[doc = concat!("SSZ `", stringify!($kind), "`, little-endian on the wire")]
        #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub $native);

        impl $name {
            pub const MIN: Self = $name(0);
            pub const MAX: Self = $name(<$native>::MAX);
            pub const BITS: u32 = <$native>::BITS;

            pub const fn new(value: $native) -> Self {
                $name(value)
            }

            pub const fn get(self) -> $native {
                self.0
            }

            /// Construct from a signed value, rejecting negatives and values
            /// wider than the type
            pub fn from_i128(value: i128) -> Result<Self> {
                <$native>::try_from(value).map($name).map_err(|_| {
                    Error::ValueOutOfRange(format!(
                        "{} does not fit in {}",
                        value,
                        stringify!($kind)
                    ))
                })
            }
        }

        impl From<$native> for $name {
            fn from(value: $native) -> Self {
                $name(value)
            }
        }

        impl From<$name> for $native {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl SafeArith for $name {
            fn safe_add(self, rhs: Self) -> Result<Self> {
                self.0
                    .checked_add(rhs.0)
                    .map($name)
                    .ok_or_else(|| out_of_range(stringify!($kind), "+"))
            }

            fn safe_sub(self, rhs: Self) -> Result<Self> {
                self.0
                    .checked_sub(rhs.0)
                    .map($name)
                    .ok_or_else(|| out_of_range(stringify!($kind), "-"))
            }

            fn safe_mul(self, rhs: Self) -> Result<Self> {
                self.0
                    .checked_mul(rhs.0)
                    .map($name)
                    .ok_or_else(|| out_of_range(stringify!($kind), "*"))
            }

            fn safe_div(self, rhs: Self) -> Result<Self> {
                self.0
                    .checked_div(rhs.0)
                    .map($name)
                    .ok_or_else(|| division_by_zero(stringify!($kind)))
            }

            fn safe_rem(self, rhs: Self) -> Result<Self> {
                self.0
                    .checked_rem(rhs.0)
                    .map($name)
                    .ok_or_else(|| division_by_zero(stringify!($kind)))
            }

            fn safe_pow(self, exp: Self) -> Result<Self> {
                let result = match u32::try_from(exp.0) {
                    Ok(e) => self.0.checked_pow(e),
                    // 0 and 1 are fixed points for any positive exponent
                    Err(_) if self.0 <= 1 => Some(self.0),
                    Err(_) => None,
                };
                result
                    .map($name)
                    .ok_or_else(|| out_of_range(stringify!($kind), "**"))
            }
        }

        impl BitAnd for $name {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                $name(self.0 & rhs.0)
            }
        }

        impl BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                $name(self.0 | rhs.0)
            }
        }

        impl BitXor for $name {
            type Output = Self;
            fn bitxor(self, rhs: Self) -> Self {
                $name(self.0 ^ rhs.0)
            }
        }

        impl Not for $name {
            type Output = Self;
            fn not(self) -> Self {
                $name(!self.0)
            }
        }

        impl Shl<u32> for $name {
            type Output = Self;
            fn shl(self, rhs: u32) -> Self {
                $name(self.0.checked_shl(rhs).unwrap_or(0))
            }
        }

        impl Shr<u32> for $name {
            type Output = Self;
            fn shr(self, rhs: u32) -> Self {
                $name(self.0.checked_shr(rhs).unwrap_or(0))
            }
        }

        impl BasicType for $name {
            const KIND: BasicKind = BasicKind::$kind;

            fn write_le(&self, out: &mut [u8]) {
                out.copy_from_slice(&self.0.to_le_bytes());
            }

            fn from_le(bytes: &[u8]) -> Result<Self> {
                let arr: [u8; std::mem::size_of::<$native>()] =
                    bytes.try_into().map_err(|_| {
                        Error::decode(format!(
                            "{} needs {} bytes, got {}",
                            stringify!($kind),
                            std::mem::size_of::<$native>(),
                            bytes.len()
                        ))
                    })?;
                Ok($name(<$native>::from_le_bytes(arr)))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($kind), self.0)
            }
        }
    };
}

/// Narrowing from `u128`; `Uint128` gets it from `From<u128>`
macro_rules! impl_try_from_u128 {
    ($($name:ident),*) => {$(
        impl TryFrom<u128> for $name {
            type Error = Error;

            fn try_from(value: u128) -> Result<Self> {
                value.try_into().map($name).map_err(|_| {
                    Error::ValueOutOfRange(format!(
                        "{} does not fit in {}",
                        value,
                        stringify!($name)
                    ))
                })
            }
        }
    )*};
}

define_uint!(Uint8, u8, Uint8);
define_uint!(Uint16, u16, Uint16);
define_uint!(Uint32, u32, Uint32);
define_uint!(Uint64, u64, Uint64);
define_uint!(Uint128, u128, Uint128);

impl_try_from_u128!(Uint8, Uint16, Uint32, Uint64);

/// Up to 64 bits, the JSON form is a plain number
macro_rules! impl_serde_number {
    ($name:ident, $native:ty) => {
        impl Serialize for $name {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                self.0.serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                <$native>::deserialize(deserializer).map($name)
            }
        }
    };
}

/// Wider integers use `0x` + the little-endian encoding in hex
macro_rules! impl_serde_le_hex {
    ($name:ident) => {
        impl Serialize for $name {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                let mut buf = vec![0u8; <$name as BasicType>::KIND.byte_length()];
                self.write_le(&mut buf);
                serializer.serialize_str(&format!("0x{}", hex::encode(buf)))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(&s))
                    .map_err(serde::de::Error::custom)?;
                <$name as BasicType>::from_le(&bytes).map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_serde_number!(Uint8, u8);
impl_serde_number!(Uint16, u16);
impl_serde_number!(Uint32, u32);
impl_serde_number!(Uint64, u64);
impl_serde_le_hex!(Uint128);
impl_serde_le_hex!(Uint256);

/// SSZ `uint256`
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uint256(pub U256);

impl Uint256 {
    pub const MIN: Self = Uint256(U256::ZERO);
    pub const MAX: Self = Uint256(U256::MAX);
    pub const BITS: u32 = 256;

    pub const fn new(value: U256) -> Self {
        Uint256(value)
    }

    pub const fn get(self) -> U256 {
        self.0
    }

    pub fn from_i128(value: i128) -> Result<Self> {
        u128::try_from(value)
            .map(|v| Uint256(U256::from(v)))
            .map_err(|_| Error::ValueOutOfRange(format!("{} does not fit in Uint256", value)))
    }
}

impl From<U256> for Uint256 {
    fn from(value: U256) -> Self {
        Uint256(value)
    }
}

impl From<u128> for Uint256 {
    fn from(value: u128) -> Self {
        Uint256(U256::from(value))
    }
}

impl From<Uint256> for U256 {
    fn from(value: Uint256) -> Self {
        value.0
    }
}

impl SafeArith for Uint256 {
    fn safe_add(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Uint256)
            .ok_or_else(|| out_of_range("Uint256", "+"))
    }

    fn safe_sub(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_sub(rhs.0)
            .map(Uint256)
            .ok_or_else(|| out_of_range("Uint256", "-"))
    }

    fn safe_mul(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_mul(rhs.0)
            .map(Uint256)
            .ok_or_else(|| out_of_range("Uint256", "*"))
    }

    fn safe_div(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_div(rhs.0)
            .map(Uint256)
            .ok_or_else(|| division_by_zero("Uint256"))
    }

    fn safe_rem(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_rem(rhs.0)
            .map(Uint256)
            .ok_or_else(|| division_by_zero("Uint256"))
    }

    fn safe_pow(self, exp: Self) -> Result<Self> {
        self.0
            .checked_pow(exp.0)
            .map(Uint256)
            .ok_or_else(|| out_of_range("Uint256", "**"))
    }
}

impl BitAnd for Uint256 {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Uint256(self.0 & rhs.0)
    }
}

impl BitOr for Uint256 {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Uint256(self.0 | rhs.0)
    }
}

impl BitXor for Uint256 {
    type Output = Self;
    fn bitxor(self, rhs: Self) -> Self {
        Uint256(self.0 ^ rhs.0)
    }
}

impl Not for Uint256 {
    type Output = Self;
    fn not(self) -> Self {
        Uint256(!self.0)
    }
}

impl Shl<u32> for Uint256 {
    type Output = Self;
    fn shl(self, rhs: u32) -> Self {
        if rhs >= Self::BITS {
            return Uint256(U256::ZERO);
        }
        Uint256(self.0.wrapping_shl(rhs as usize))
    }
}

impl Shr<u32> for Uint256 {
    type Output = Self;
    fn shr(self, rhs: u32) -> Self {
        if rhs >= Self::BITS {
            return Uint256(U256::ZERO);
        }
        Uint256(self.0.wrapping_shr(rhs as usize))
    }
}

impl BasicType for Uint256 {
    const KIND: BasicKind = BasicKind::Uint256;

    fn write_le(&self, out: &mut [u8]) {
        out.copy_from_slice(&self.0.to_le_bytes::<32>());
    }

    fn from_le(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            Error::decode(format!("Uint256 needs 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Uint256(U256::from_le_bytes(arr)))
    }
}

impl fmt::Display for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uint256({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Encodable, TreeBacked};

    #[test]
    fn test_bounds() {
        assert!(Uint8::try_from(256u128).is_err());
        assert!(Uint8::from_i128(-1).is_err());
        assert_eq!(Uint8::from_i128(255).unwrap(), Uint8::MAX);
        assert!(Uint64::try_from(u128::from(u64::MAX) + 1).is_err());
        assert!(Uint256::from_i128(-5).is_err());
    }

    #[test]
    fn test_overflow_fails() {
        assert!(matches!(
            Uint8(255).safe_add(Uint8(1)),
            Err(Error::ValueOutOfRange(_))
        ));
        assert!(Uint16(0).safe_sub(Uint16(1)).is_err());
        assert!(Uint32(1 << 16).safe_mul(Uint32(1 << 16)).is_err());
        assert!(Uint64(1).safe_div(Uint64(0)).is_err());
        assert!(Uint64(1).safe_rem(Uint64(0)).is_err());
        assert!(Uint8(2).safe_pow(Uint8(8)).is_err());
        assert!(Uint256::MAX.safe_add(Uint256::from(1u128)).is_err());
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(Uint8(200).safe_add(Uint8(55)).unwrap(), Uint8(255));
        assert_eq!(Uint64(7).safe_div(Uint64(2)).unwrap(), Uint64(3));
        assert_eq!(Uint64(7).safe_rem(Uint64(2)).unwrap(), Uint64(1));
        assert_eq!(Uint16(3).safe_pow(Uint16(4)).unwrap(), Uint16(81));
        assert_eq!(Uint8(1).safe_pow(Uint8(255)).unwrap(), Uint8(1));
        let big = Uint256::from(u128::MAX);
        assert_eq!(
            big.safe_mul(Uint256::from(2u128)).unwrap().get(),
            U256::from(u128::MAX) * U256::from(2u8)
        );
    }

    #[test]
    fn test_shifts_clip() {
        assert_eq!(Uint8(5) << 8, Uint8(0));
        assert_eq!(Uint8(0b1100_0001) << 1, Uint8(0b1000_0010));
        assert_eq!(Uint8(0x80) >> 7, Uint8(1));
        assert_eq!(Uint32(1) << 40, Uint32(0));
        assert_eq!(Uint256::from(1u128) << 256, Uint256::MIN);
        assert_eq!((Uint256::from(3u128) << 255) >> 255, Uint256::from(1u128));
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(Uint8(0b1100) & Uint8(0b1010), Uint8(0b1000));
        assert_eq!(Uint8(0b1100) | Uint8(0b1010), Uint8(0b1110));
        assert_eq!(Uint8(0b1100) ^ Uint8(0b1010), Uint8(0b0110));
        assert_eq!(!Uint8(0), Uint8::MAX);
        assert_eq!(!Uint256::MIN, Uint256::MAX);
    }

    #[test]
    fn test_little_endian_encoding() {
        assert_eq!(Uint32(0x0403_0201).encode_bytes().unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(Uint16::from_le(&[0x34, 0x12]).unwrap(), Uint16(0x1234));
        assert!(Uint16::from_le(&[1, 2, 3]).is_err());
        let v = Uint256::from(0x0102u128);
        let bytes = v.encode_bytes().unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[..2], &[2, 1]);
        assert_eq!(Uint256::from_le(&bytes).unwrap(), v);
    }

    #[test]
    fn test_hash_tree_root_is_padded_chunk() {
        let root = Uint64(0x0102).hash_tree_root();
        assert_eq!(&root.as_bytes()[..3], &[2, 1, 0]);
        assert!(root.as_bytes()[8..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_json_forms() {
        assert_eq!(serde_json::to_string(&Uint64(42)).unwrap(), "42");
        assert_eq!(
            serde_json::to_string(&Uint128(1)).unwrap(),
            format!("\"0x01{}\"", "00".repeat(15))
        );
        let json = serde_json::to_string(&Uint128(7)).unwrap();
        let back: Uint128 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Uint128(7));
        let wide: Uint256 = serde_json::from_str(&format!("\"0x02{}\"", "00".repeat(31))).unwrap();
        assert_eq!(wide, Uint256::from(2u128));
    }
}
