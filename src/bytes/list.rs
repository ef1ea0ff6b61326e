//! `ByteList[N]` views

use crate::hash::Root;
use crate::tree::{depth_for, fill_to_contents, Node};
use crate::view::{
    pack_bytes_to_chunks, unpack_bytes_from_chunks, Encodable, TreeBacked, TypeDef,
};
use crate::{Error, Result, BYTES_PER_CHUNK};
use bytes::Bytes;
use once_cell::sync::OnceCell;
use serde::{Serialize, Serializer};
use std::fmt;

/// Variable-length raw bytes up to a limit, `ByteList[N]`.
///
/// The tree pairs the packed contents with the length, so two lists with the
/// same bytes but different lengths never share a root.
#[derive(Clone)]
pub struct ByteList {
    data: Bytes,
    limit: u64,
    backing: OnceCell<Node>,
}

pub(crate) fn check_limit(length: u64, limit: u64) -> Result<()> {
    if length > limit {
        tracing::debug!(length, limit, "list length over its limit");
        return Err(Error::LimitExceeded { length, limit });
    }
    Ok(())
}

impl ByteList {
    pub fn new(data: impl Into<Bytes>, limit: u64) -> Result<Self> {
        let data = data.into();
        check_limit(data.len() as u64, limit)?;
        Ok(ByteList {
            data,
            limit,
            backing: OnceCell::new(),
        })
    }

    pub fn empty(limit: u64) -> Self {
        ByteList {
            data: Bytes::new(),
            limit,
            backing: OnceCell::new(),
        }
    }

    pub fn from_backing(node: Node, limit: u64) -> Result<Self> {
        let (contents, length_leaf) = node
            .children()
            .ok_or_else(|| Error::navigation("ByteList backing must be a pair"))?;
        let length = read_length(&length_leaf.merkle_root())?;
        check_limit(length, limit)?;
        let data = unpack_bytes_from_chunks(contents, contents_depth(limit), length as usize)?;
        let view = ByteList::new(data, limit)?;
        let _ = view.backing.set(node);
        Ok(view)
    }

    pub fn decode(bytes: &[u8], limit: u64) -> Result<Self> {
        ByteList::new(Bytes::copy_from_slice(bytes), limit)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn type_def(&self) -> TypeDef {
        TypeDef::ByteList(self.limit)
    }

    pub fn get(&self, index: u64) -> Result<u8> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.data.get(i).copied())
            .ok_or_else(|| {
                Error::navigation(format!(
                    "index {} out of a ByteList of length {}",
                    index,
                    self.len()
                ))
            })
    }

    pub fn with_byte(&self, index: u64, byte: u8) -> Result<Self> {
        self.get(index)?;
        let mut data = self.data.to_vec();
        data[index as usize] = byte;
        ByteList::new(data, self.limit)
    }

    /// A copy with one more byte at the end
    pub fn appended(&self, byte: u8) -> Result<Self> {
        let mut data = self.data.to_vec();
        data.push(byte);
        ByteList::new(data, self.limit)
    }

    /// A copy without the last byte, and that byte
    pub fn popped(&self) -> Result<(Self, u8)> {
        let (&last, rest) = self
            .data
            .split_last()
            .ok_or_else(|| Error::ValueOutOfRange("pop from an empty ByteList".into()))?;
        Ok((ByteList::new(rest.to_vec(), self.limit)?, last))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.data))
    }

    pub fn from_hex(s: &str, limit: u64) -> Result<Self> {
        ByteList::new(hex::decode(s.strip_prefix("0x").unwrap_or(s))?, limit)
    }

    fn build_backing(&self) -> Node {
        let chunks = pack_bytes_to_chunks(&self.data);
        let contents = fill_to_contents(&chunks, contents_depth(self.limit));
        Node::pair(contents, Node::leaf(Root::from_length(self.data.len() as u64)))
    }
}

fn contents_depth(limit: u64) -> u32 {
    depth_for(limit.div_ceil(BYTES_PER_CHUNK as u64))
}

/// Length mix-in leaf to a length; the value must fit 64 bits
pub(crate) fn read_length(chunk: &Root) -> Result<u64> {
    let bytes = chunk.as_bytes();
    if bytes[8..].iter().any(|b| *b != 0) {
        return Err(Error::ValueOutOfRange("length does not fit 64 bits".into()));
    }
    let mut le = [0u8; 8];
    le.copy_from_slice(&bytes[..8]);
    Ok(u64::from_le_bytes(le))
}

impl Encodable for ByteList {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.data);
        Ok(())
    }
}

impl TreeBacked for ByteList {
    fn get_backing(&self) -> Node {
        self.backing.get_or_init(|| self.build_backing()).clone()
    }
}

impl PartialEq for ByteList {
    fn eq(&self, other: &Self) -> bool {
        self.limit == other.limit && self.data == other.data
    }
}

impl Eq for ByteList {}

impl AsRef<[u8]> for ByteList {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for ByteList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteList[{}]({})", self.limit, self.to_hex())
    }
}

impl Serialize for ByteList {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::zero_root;

    #[test]
    fn test_length_mixin() {
        let list = ByteList::new(vec![1u8, 2, 3], 10).unwrap();
        let backing = list.get_backing();
        let (contents, length) = backing.children().unwrap();
        assert_eq!(length.merkle_root(), Root::from_length(3));
        assert_eq!(&contents.merkle_root().as_bytes()[..4], &[1, 2, 3, 0]);

        // same chunk contents, different length
        let padded = ByteList::new(vec![1u8, 2, 3, 0], 10).unwrap();
        assert_eq!(
            padded.get_backing().get_left().unwrap().merkle_root(),
            contents.merkle_root()
        );
        assert_ne!(padded.hash_tree_root(), list.hash_tree_root());
    }

    #[test]
    fn test_empty_root() {
        let list = ByteList::empty(100);
        let expected = Root::combine(&zero_root(2), &Root::ZERO);
        assert_eq!(list.hash_tree_root(), expected);
    }

    #[test]
    fn test_limit() {
        assert!(matches!(
            ByteList::decode(&[0u8; 11], 10),
            Err(Error::LimitExceeded { length: 11, limit: 10 })
        ));
        let full = ByteList::new(vec![0u8; 10], 10).unwrap();
        assert!(full.appended(1).is_err());
    }

    #[test]
    fn test_from_backing_roundtrip() {
        let data: Vec<u8> = (0..70).collect();
        let list = ByteList::new(data.clone(), 100).unwrap();
        let back = ByteList::from_backing(list.get_backing(), 100).unwrap();
        assert_eq!(back.as_bytes(), &data[..]);
        assert!(ByteList::from_backing(list.get_backing(), 50).is_err());
    }

    #[test]
    fn test_append_pop() {
        let list = ByteList::empty(4).appended(7).unwrap().appended(8).unwrap();
        assert_eq!(list.as_bytes(), &[7, 8]);
        let (rest, last) = list.popped().unwrap();
        assert_eq!(last, 8);
        assert_eq!(rest, ByteList::new(vec![7u8], 4).unwrap());
        assert!(ByteList::empty(4).popped().is_err());
    }
}
