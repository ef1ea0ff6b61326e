//! Basic scalar views: `boolean` and `uint8` through `uint256`
//!
//! Scalars are immutable values. As tree elements they are packed, several
//! per 32-byte chunk, so they never own a backing node of their own; asking
//! for one yields a fresh leaf holding the encoding.

mod boolean;
mod uint;

pub use boolean::Boolean;
pub use uint::{SafeArith, Uint128, Uint16, Uint256, Uint32, Uint64, Uint8};

use crate::hash::Root;
use crate::tree::Node;
use crate::view::{Encodable, TreeBacked};
use crate::{Error, Result, BYTES_PER_CHUNK};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The scalar kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasicKind {
    Boolean,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uint128,
    Uint256,
}

impl BasicKind {
    pub const fn byte_length(self) -> usize {
        match self {
            BasicKind::Boolean | BasicKind::Uint8 => 1,
            BasicKind::Uint16 => 2,
            BasicKind::Uint32 => 4,
            BasicKind::Uint64 => 8,
            BasicKind::Uint128 => 16,
            BasicKind::Uint256 => 32,
        }
    }

    /// How many values share one chunk
    pub const fn per_chunk(self) -> usize {
        BYTES_PER_CHUNK / self.byte_length()
    }

    pub const fn name(self) -> &'static str {
        match self {
            BasicKind::Boolean => "boolean",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uint128 => "uint128",
            BasicKind::Uint256 => "uint256",
        }
    }
}

impl fmt::Display for BasicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A statically typed scalar
pub trait BasicType:
    Copy + Eq + Default + fmt::Debug + Into<BasicValue> + TryFrom<BasicValue, Error = Error>
{
    const KIND: BasicKind;

    /// Write the little-endian encoding into exactly `KIND.byte_length()` bytes
    fn write_le(&self, out: &mut [u8]);

    /// Read from exactly `KIND.byte_length()` bytes
    fn from_le(bytes: &[u8]) -> Result<Self>;
}

/// A scalar of any kind, for code that only knows the kind at run time
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicValue {
    Boolean(Boolean),
    Uint8(Uint8),
    Uint16(Uint16),
    Uint32(Uint32),
    Uint64(Uint64),
    Uint128(Uint128),
    Uint256(Uint256),
}

/// Binary operators of the scalar arithmetic
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    FloorDiv,
    TrueDiv,
    Mod,
    Pow,
    And,
    Or,
    Xor,
}

/// Unary operators of the scalar arithmetic
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Invert,
    Neg,
    Pos,
    Abs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftOp {
    Left,
    Right,
}

fn binary_op<T: SafeArith>(a: T, op: BinaryOp, b: T) -> Result<T> {
    match op {
        BinaryOp::Add => a.safe_add(b),
        BinaryOp::Sub => a.safe_sub(b),
        BinaryOp::Mul => a.safe_mul(b),
        BinaryOp::FloorDiv => a.safe_div(b),
        BinaryOp::Mod => a.safe_rem(b),
        BinaryOp::Pow => a.safe_pow(b),
        BinaryOp::And => Ok(a & b),
        BinaryOp::Or => Ok(a | b),
        BinaryOp::Xor => Ok(a ^ b),
        BinaryOp::TrueDiv => Err(Error::UnsupportedOperation(
            "true division on unsigned integers, use floor division".into(),
        )),
    }
}

fn unary_op<T: SafeArith>(a: T, op: UnaryOp) -> Result<T> {
    match op {
        UnaryOp::Invert => Ok(!a),
        UnaryOp::Pos | UnaryOp::Abs => Ok(a),
        UnaryOp::Neg => Err(Error::UnsupportedOperation(
            "negation of an unsigned integer".into(),
        )),
    }
}

fn shift_op<T: SafeArith>(a: T, op: ShiftOp, amount: u32) -> T {
    match op {
        ShiftOp::Left => a << amount,
        ShiftOp::Right => a >> amount,
    }
}

/// Dispatch over the uint variants of a `BasicValue`, rejecting booleans
macro_rules! map_uint {
    ($value:expr, |$x:ident| $body:expr) => {
        match $value {
            BasicValue::Boolean(_) => Err(Error::UnsupportedOperation(
                "arithmetic on a boolean".into(),
            )),
            BasicValue::Uint8($x) => $body.map(BasicValue::Uint8),
            BasicValue::Uint16($x) => $body.map(BasicValue::Uint16),
            BasicValue::Uint32($x) => $body.map(BasicValue::Uint32),
            BasicValue::Uint64($x) => $body.map(BasicValue::Uint64),
            BasicValue::Uint128($x) => $body.map(BasicValue::Uint128),
            BasicValue::Uint256($x) => $body.map(BasicValue::Uint256),
        }
    };
}

impl BasicValue {
    pub fn kind(&self) -> BasicKind {
        match self {
            BasicValue::Boolean(_) => BasicKind::Boolean,
            BasicValue::Uint8(_) => BasicKind::Uint8,
            BasicValue::Uint16(_) => BasicKind::Uint16,
            BasicValue::Uint32(_) => BasicKind::Uint32,
            BasicValue::Uint64(_) => BasicKind::Uint64,
            BasicValue::Uint128(_) => BasicKind::Uint128,
            BasicValue::Uint256(_) => BasicKind::Uint256,
        }
    }

    /// The zero value of a kind
    pub fn default_of(kind: BasicKind) -> Self {
        match kind {
            BasicKind::Boolean => BasicValue::Boolean(Boolean::default()),
            BasicKind::Uint8 => BasicValue::Uint8(Uint8::default()),
            BasicKind::Uint16 => BasicValue::Uint16(Uint16::default()),
            BasicKind::Uint32 => BasicValue::Uint32(Uint32::default()),
            BasicKind::Uint64 => BasicValue::Uint64(Uint64::default()),
            BasicKind::Uint128 => BasicValue::Uint128(Uint128::default()),
            BasicKind::Uint256 => BasicValue::Uint256(Uint256::default()),
        }
    }

    /// Normalize an integer into a scalar of the given kind, bounds checked
    pub fn coerce(kind: BasicKind, value: i128) -> Result<Self> {
        Ok(match kind {
            BasicKind::Boolean => BasicValue::Boolean(Boolean::from_i128(value)?),
            BasicKind::Uint8 => BasicValue::Uint8(Uint8::from_i128(value)?),
            BasicKind::Uint16 => BasicValue::Uint16(Uint16::from_i128(value)?),
            BasicKind::Uint32 => BasicValue::Uint32(Uint32::from_i128(value)?),
            BasicKind::Uint64 => BasicValue::Uint64(Uint64::from_i128(value)?),
            BasicKind::Uint128 => BasicValue::Uint128(Uint128::from_i128(value)?),
            BasicKind::Uint256 => BasicValue::Uint256(Uint256::from_i128(value)?),
        })
    }

    pub fn write_le(&self, out: &mut [u8]) {
        match self {
            BasicValue::Boolean(v) => v.write_le(out),
            BasicValue::Uint8(v) => v.write_le(out),
            BasicValue::Uint16(v) => v.write_le(out),
            BasicValue::Uint32(v) => v.write_le(out),
            BasicValue::Uint64(v) => v.write_le(out),
            BasicValue::Uint128(v) => v.write_le(out),
            BasicValue::Uint256(v) => v.write_le(out),
        }
    }

    pub fn from_le(kind: BasicKind, bytes: &[u8]) -> Result<Self> {
        Ok(match kind {
            BasicKind::Boolean => BasicValue::Boolean(Boolean::from_le(bytes)?),
            BasicKind::Uint8 => BasicValue::Uint8(Uint8::from_le(bytes)?),
            BasicKind::Uint16 => BasicValue::Uint16(Uint16::from_le(bytes)?),
            BasicKind::Uint32 => BasicValue::Uint32(Uint32::from_le(bytes)?),
            BasicKind::Uint64 => BasicValue::Uint64(Uint64::from_le(bytes)?),
            BasicKind::Uint128 => BasicValue::Uint128(Uint128::from_le(bytes)?),
            BasicKind::Uint256 => BasicValue::Uint256(Uint256::from_le(bytes)?),
        })
    }

    /// Read the `index`-th value of this kind packed in a chunk
    pub fn from_chunk(kind: BasicKind, chunk: &Root, index: usize) -> Result<Self> {
        let size = kind.byte_length();
        let start = index * size;
        let bytes = chunk
            .as_bytes()
            .get(start..start + size)
            .ok_or_else(|| {
                Error::navigation(format!("{} is not a slot of a {} chunk", index, kind))
            })?;
        BasicValue::from_le(kind, bytes)
    }

    /// Re-type a scalar, failing if the value does not fit the target kind
    pub fn convert(self, kind: BasicKind) -> Result<BasicValue> {
        if kind == self.kind() {
            return Ok(self);
        }
        let mut buf = [0u8; BYTES_PER_CHUNK];
        self.write_le(&mut buf[..self.kind().byte_length()]);
        let width = kind.byte_length();
        let too_wide = buf[width..].iter().any(|b| *b != 0);
        if too_wide || (kind == BasicKind::Boolean && buf[0] > 1) {
            return Err(Error::ValueOutOfRange(format!("{:?} does not fit {}", self, kind)));
        }
        BasicValue::from_le(kind, &buf[..width])
    }

    /// Whether this value is nonzero (or `true`)
    pub fn is_truthy(&self) -> bool {
        match self {
            BasicValue::Boolean(v) => v.0,
            other => {
                let mut buf = [0u8; 32];
                let len = other.kind().byte_length();
                other.write_le(&mut buf[..len]);
                buf.iter().any(|b| *b != 0)
            }
        }
    }

    /// Apply a binary operator; both operands must be uints of the same width
    pub fn apply(self, op: BinaryOp, rhs: BasicValue) -> Result<BasicValue> {
        if self.kind() != rhs.kind() {
            return Err(Error::UnsupportedOperation(format!(
                "{:?} between {} and {}",
                op,
                self.kind(),
                rhs.kind()
            )));
        }
        match (self, rhs) {
            (BasicValue::Uint8(a), BasicValue::Uint8(b)) => {
                binary_op(a, op, b).map(BasicValue::Uint8)
            }
            (BasicValue::Uint16(a), BasicValue::Uint16(b)) => {
                binary_op(a, op, b).map(BasicValue::Uint16)
            }
            (BasicValue::Uint32(a), BasicValue::Uint32(b)) => {
                binary_op(a, op, b).map(BasicValue::Uint32)
            }
            (BasicValue::Uint64(a), BasicValue::Uint64(b)) => {
                binary_op(a, op, b).map(BasicValue::Uint64)
            }
            (BasicValue::Uint128(a), BasicValue::Uint128(b)) => {
                binary_op(a, op, b).map(BasicValue::Uint128)
            }
            (BasicValue::Uint256(a), BasicValue::Uint256(b)) => {
                binary_op(a, op, b).map(BasicValue::Uint256)
            }
            _ => Err(Error::UnsupportedOperation(format!("{:?} on a boolean", op))),
        }
    }

    pub fn apply_unary(self, op: UnaryOp) -> Result<BasicValue> {
        map_uint!(self, |x| unary_op(x, op))
    }

    /// Shift by a plain amount; left shifts clip to the width
    pub fn shift(self, op: ShiftOp, amount: u32) -> Result<BasicValue> {
        map_uint!(self, |x| Ok::<_, Error>(shift_op(x, op, amount)))
    }

    /// JSON form: booleans and uints up to 64 bits as native values,
    /// wider uints as `0x` + little-endian hex
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let value = match self {
            BasicValue::Boolean(v) => serde_json::to_value(v),
            BasicValue::Uint8(v) => serde_json::to_value(v),
            BasicValue::Uint16(v) => serde_json::to_value(v),
            BasicValue::Uint32(v) => serde_json::to_value(v),
            BasicValue::Uint64(v) => serde_json::to_value(v),
            BasicValue::Uint128(v) => serde_json::to_value(v),
            BasicValue::Uint256(v) => serde_json::to_value(v),
        };
        value.map_err(|e| Error::decode(e.to_string()))
    }

    pub fn from_json(kind: BasicKind, value: serde_json::Value) -> Result<Self> {
        let parsed = match kind {
            BasicKind::Boolean => serde_json::from_value(value).map(BasicValue::Boolean),
            BasicKind::Uint8 => serde_json::from_value(value).map(BasicValue::Uint8),
            BasicKind::Uint16 => serde_json::from_value(value).map(BasicValue::Uint16),
            BasicKind::Uint32 => serde_json::from_value(value).map(BasicValue::Uint32),
            BasicKind::Uint64 => serde_json::from_value(value).map(BasicValue::Uint64),
            BasicKind::Uint128 => serde_json::from_value(value).map(BasicValue::Uint128),
            BasicKind::Uint256 => serde_json::from_value(value).map(BasicValue::Uint256),
        };
        parsed.map_err(|e| Error::decode(e.to_string()))
    }
}

impl fmt::Debug for BasicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasicValue::Boolean(v) => fmt::Debug::fmt(v, f),
            BasicValue::Uint8(v) => fmt::Debug::fmt(v, f),
            BasicValue::Uint16(v) => fmt::Debug::fmt(v, f),
            BasicValue::Uint32(v) => fmt::Debug::fmt(v, f),
            BasicValue::Uint64(v) => fmt::Debug::fmt(v, f),
            BasicValue::Uint128(v) => fmt::Debug::fmt(v, f),
            BasicValue::Uint256(v) => fmt::Debug::fmt(v, f),
        }
    }
}

macro_rules! impl_basic_value_conversions {
    ($($name:ident),*) => {$(
        impl From<$name> for BasicValue {
            fn from(value: $name) -> Self {
                BasicValue::$name(value)
            }
        }

        impl TryFrom<BasicValue> for $name {
            type Error = Error;

            fn try_from(value: BasicValue) -> Result<Self> {
                match value {
                    BasicValue::$name(v) => Ok(v),
                    other => Err(Error::UnsupportedOperation(format!(
                        "expected {}, got {}",
                        BasicKind::$name,
                        other.kind()
                    ))),
                }
            }
        }

        impl Encodable for $name {
            fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
                BasicValue::$name(*self).encode_into(out)
            }
        }

        impl TreeBacked for $name {
            fn get_backing(&self) -> Node {
                BasicValue::$name(*self).get_backing()
            }
        }
    )*};
}

impl_basic_value_conversions!(Boolean, Uint8, Uint16, Uint32, Uint64, Uint128, Uint256);

impl Encodable for BasicValue {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        let start = out.len();
        out.resize(start + self.kind().byte_length(), 0);
        self.write_le(&mut out[start..]);
        Ok(())
    }
}

impl TreeBacked for BasicValue {
    fn get_backing(&self) -> Node {
        let mut chunk = [0u8; 32];
        self.write_le(&mut chunk[..self.kind().byte_length()]);
        Node::leaf(Root::from_bytes(chunk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_arithmetic() {
        let a = BasicValue::Uint8(Uint8(5));
        let b = BasicValue::Uint8(Uint8(3));
        assert_eq!(a.apply(BinaryOp::Add, b).unwrap(), BasicValue::Uint8(Uint8(8)));
        assert_eq!(a.apply(BinaryOp::FloorDiv, b).unwrap(), BasicValue::Uint8(Uint8(1)));
        assert_eq!(a.apply(BinaryOp::Xor, b).unwrap(), BasicValue::Uint8(Uint8(6)));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let max = BasicValue::Uint8(Uint8(255));
        let one = BasicValue::Uint8(Uint8(1));
        assert!(matches!(max.apply(BinaryOp::Add, one), Err(Error::ValueOutOfRange(_))));
    }

    #[test]
    fn test_mixed_widths_rejected() {
        let a = BasicValue::Uint8(Uint8(1));
        let b = BasicValue::Uint16(Uint16(1));
        assert!(matches!(a.apply(BinaryOp::Add, b), Err(Error::UnsupportedOperation(_))));
    }

    #[test]
    fn test_unsupported_operations() {
        let a = BasicValue::Uint64(Uint64(6));
        let b = BasicValue::Uint64(Uint64(3));
        assert!(matches!(a.apply(BinaryOp::TrueDiv, b), Err(Error::UnsupportedOperation(_))));
        assert!(matches!(a.apply_unary(UnaryOp::Neg), Err(Error::UnsupportedOperation(_))));
        assert_eq!(a.apply_unary(UnaryOp::Abs).unwrap(), a);
        assert_eq!(a.apply_unary(UnaryOp::Pos).unwrap(), a);
        assert_eq!(
            BasicValue::Uint8(Uint8(0)).apply_unary(UnaryOp::Invert).unwrap(),
            BasicValue::Uint8(Uint8(255))
        );
    }

    #[test]
    fn test_boolean_has_no_arithmetic() {
        let t = BasicValue::Boolean(Boolean(true));
        assert!(t.apply(BinaryOp::And, t).is_err());
        assert!(t.apply_unary(UnaryOp::Invert).is_err());
        assert!(t.shift(ShiftOp::Left, 1).is_err());
        assert!(t.is_truthy());
    }

    #[test]
    fn test_shift_clips() {
        let v = BasicValue::Uint8(Uint8(5));
        assert_eq!(v.shift(ShiftOp::Left, 8).unwrap(), BasicValue::Uint8(Uint8(0)));
        assert_eq!(v.shift(ShiftOp::Right, 2).unwrap(), BasicValue::Uint8(Uint8(1)));
    }

    #[test]
    fn test_coerce_bounds() {
        assert!(BasicValue::coerce(BasicKind::Uint8, 256).is_err());
        assert!(BasicValue::coerce(BasicKind::Uint16, -1).is_err());
        assert!(BasicValue::coerce(BasicKind::Boolean, 2).is_err());
        assert_eq!(
            BasicValue::coerce(BasicKind::Uint32, 7).unwrap(),
            BasicValue::Uint32(Uint32(7))
        );
    }

    #[test]
    fn test_convert() {
        let v = BasicValue::Uint64(Uint64(300));
        assert_eq!(
            v.convert(BasicKind::Uint16).unwrap(),
            BasicValue::Uint16(Uint16(300))
        );
        assert!(matches!(v.convert(BasicKind::Uint8), Err(Error::ValueOutOfRange(_))));
        assert!(v.convert(BasicKind::Boolean).is_err());
        assert_eq!(
            BasicValue::Uint8(Uint8(1)).convert(BasicKind::Boolean).unwrap(),
            BasicValue::Boolean(Boolean(true))
        );
    }

    #[test]
    fn test_from_chunk() {
        let mut chunk = [0u8; 32];
        chunk[4..8].copy_from_slice(&9u32.to_le_bytes());
        let root = Root::from_bytes(chunk);
        assert_eq!(
            BasicValue::from_chunk(BasicKind::Uint32, &root, 1).unwrap(),
            BasicValue::Uint32(Uint32(9))
        );
        assert!(BasicValue::from_chunk(BasicKind::Uint32, &root, 8).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let v = BasicValue::Uint64(Uint64(12));
        let json = v.to_json().unwrap();
        assert_eq!(json, serde_json::json!(12));
        assert_eq!(BasicValue::from_json(BasicKind::Uint64, json).unwrap(), v);

        let wide = BasicValue::Uint256(Uint256::from(1u128));
        let json = wide.to_json().unwrap();
        assert!(json.as_str().unwrap().starts_with("0x01"));
        assert_eq!(BasicValue::from_json(BasicKind::Uint256, json).unwrap(), wide);
    }
}
