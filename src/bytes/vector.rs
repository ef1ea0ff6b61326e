//! `ByteVector[N]` views

use crate::hash::Root;
use crate::tree::{depth_for, fill_to_contents, Node};
use crate::view::{
    pack_bytes_to_chunks, unpack_bytes_from_chunks, Encodable, TreeBacked, TypeDef,
};
use crate::{Error, Result, BYTES_PER_CHUNK};
use bytes::Bytes;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Fixed-length raw bytes, `ByteVector[N]`.
///
/// The bytes are the source of truth. The Merkle tree is built on first
/// request and cached, so plain encode/decode never pays for hashing.
#[derive(Clone)]
pub struct ByteVector {
    data: Bytes,
    backing: OnceCell<Node>,
}

impl ByteVector {
    pub fn new(data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        if data.is_empty() {
            return Err(Error::ValueOutOfRange("ByteVector of length 0".into()));
        }
        Ok(ByteVector::from_bytes_unchecked(data))
    }

    pub(crate) fn from_bytes_unchecked(data: Bytes) -> Self {
        ByteVector {
            data,
            backing: OnceCell::new(),
        }
    }

    pub fn zeroed(length: usize) -> Result<Self> {
        ByteVector::new(vec![0u8; length])
    }

    /// Read `length` bytes back out of a tree
    pub fn from_backing(node: Node, length: u64) -> Result<Self> {
        let length = usize::try_from(length)
            .map_err(|_| Error::ValueOutOfRange(format!("ByteVector[{}] is too large", length)))?;
        let depth = depth_for(length.div_ceil(BYTES_PER_CHUNK) as u64);
        let data = unpack_bytes_from_chunks(&node, depth, length)?;
        let view = ByteVector::new(data)?;
        let _ = view.backing.set(node);
        Ok(view)
    }

    pub fn decode(bytes: &[u8], length: u64) -> Result<Self> {
        if bytes.len() as u64 != length {
            return Err(Error::decode(format!(
                "ByteVector[{}] got {} bytes",
                length,
                bytes.len()
            )));
        }
        ByteVector::new(Bytes::copy_from_slice(bytes))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false: a zero-length byte vector is not a type
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn type_def(&self) -> TypeDef {
        TypeDef::ByteVector(self.data.len() as u64)
    }

    pub fn get(&self, index: u64) -> Result<u8> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.data.get(i).copied())
            .ok_or_else(|| {
                Error::navigation(format!("index {} out of ByteVector[{}]", index, self.len()))
            })
    }

    /// A copy with one byte replaced
    pub fn with_byte(&self, index: u64, byte: u8) -> Result<Self> {
        self.get(index)?;
        let mut data = self.data.to_vec();
        data[index as usize] = byte;
        ByteVector::new(data)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.data))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        ByteVector::new(hex::decode(s.strip_prefix("0x").unwrap_or(s))?)
    }

    fn build_backing(&self) -> Node {
        if self.data.len() <= BYTES_PER_CHUNK {
            let mut chunk = [0u8; BYTES_PER_CHUNK];
            chunk[..self.data.len()].copy_from_slice(&self.data);
            return Node::leaf(Root::from_bytes(chunk));
        }
        let chunks = pack_bytes_to_chunks(&self.data);
        let depth = depth_for(chunks.len() as u64);
        fill_to_contents(&chunks, depth)
    }
}

impl Encodable for ByteVector {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.data);
        Ok(())
    }
}

impl TreeBacked for ByteVector {
    fn get_backing(&self) -> Node {
        self.backing.get_or_init(|| self.build_backing()).clone()
    }
}

impl PartialEq for ByteVector {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for ByteVector {}

impl AsRef<[u8]> for ByteVector {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for ByteVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteVector[{}]({})", self.len(), self.to_hex())
    }
}

impl Serialize for ByteVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ByteVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ByteVector::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_vector_is_one_leaf() {
        let v = ByteVector::new(vec![1u8, 2, 3]).unwrap();
        let backing = v.get_backing();
        assert!(backing.is_leaf());
        assert_eq!(&backing.merkle_root().as_bytes()[..4], &[1, 2, 3, 0]);
    }

    #[test]
    fn test_long_vector_is_chunked() {
        let data: Vec<u8> = (0..48).collect();
        let v = ByteVector::new(data.clone()).unwrap();
        let backing = v.get_backing();
        assert!(!backing.is_leaf());
        let back = ByteVector::from_backing(backing, 48).unwrap();
        assert_eq!(back.as_bytes(), &data[..]);
    }

    #[test]
    fn test_backing_is_cached() {
        let v = ByteVector::zeroed(64).unwrap();
        assert!(Node::ptr_eq(&v.get_backing(), &v.get_backing()));
    }

    #[test]
    fn test_decode_checks_length() {
        assert!(matches!(ByteVector::decode(&[1, 2], 3), Err(Error::Decode(_))));
        assert_eq!(ByteVector::decode(&[1, 2], 2).unwrap().len(), 2);
    }

    #[test]
    fn test_backing_mutation_refused() {
        let mut v = ByteVector::zeroed(4).unwrap();
        assert!(matches!(
            v.set_backing(Node::leaf(Root::ZERO)),
            Err(Error::UnsupportedMutation(_))
        ));
    }

    #[test]
    fn test_hex_json() {
        let v = ByteVector::new(vec![0xab, 0xcd]).unwrap();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"0xabcd\"");
        let back: ByteVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_with_byte() {
        let v = ByteVector::zeroed(4).unwrap();
        let w = v.with_byte(2, 9).unwrap();
        assert_eq!(w.as_bytes(), &[0, 0, 9, 0]);
        assert!(v.with_byte(4, 1).is_err());
        assert_ne!(v.hash_tree_root(), w.hash_tree_root());
    }
}
