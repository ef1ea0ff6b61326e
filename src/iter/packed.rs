//! Scalars unpacked from the chunks of a packed sequence

use super::NodeIter;
use crate::basic::{BasicKind, BasicType, BasicValue};
use crate::hash::Root;
use crate::tree::Node;
use crate::view::packed_chunk_count;
use crate::Result;

/// Yields `length` scalars of one kind, packed `32 / width` per chunk
pub struct PackedIter {
    kind: BasicKind,
    chunks: NodeIter,
    current: Root,
    length: u64,
    index: u64,
}

impl PackedIter {
    pub fn new(anchor: Node, depth: u32, kind: BasicKind, length: u64) -> Result<Self> {
        Ok(PackedIter {
            kind,
            chunks: NodeIter::new(anchor, depth, packed_chunk_count(kind, length))?,
            current: Root::ZERO,
            length,
            index: 0,
        })
    }

    pub fn kind(&self) -> BasicKind {
        self.kind
    }

    /// Narrow to a statically known scalar type
    pub fn typed<T: BasicType>(self) -> impl Iterator<Item = Result<T>> {
        self.map(|value| value.and_then(T::try_from))
    }
}

impl Iterator for PackedIter {
    type Item = Result<BasicValue>;

    fn next(&mut self) -> Option<Result<BasicValue>> {
        if self.index >= self.length {
            return None;
        }
        let per_chunk = self.kind.per_chunk() as u64;
        let slot = (self.index % per_chunk) as usize;
        if slot == 0 {
            match self.chunks.next()? {
                Ok(chunk) => self.current = chunk.merkle_root(),
                Err(e) => {
                    self.index = self.length;
                    return Some(Err(e));
                }
            }
        }
        self.index += 1;
        Some(BasicValue::from_chunk(self.kind, &self.current, slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Uint16;
    use crate::tree::subtree_fill_to_contents;
    use crate::view::pack_ints_to_chunks;

    #[test]
    fn test_packed_uint16() {
        let values: Vec<Uint16> = (0..40).map(|i| Uint16(i * 1000)).collect();
        let tree = subtree_fill_to_contents(&pack_ints_to_chunks(&values), 2).unwrap();
        let read: Vec<Uint16> = PackedIter::new(tree, 2, BasicKind::Uint16, 40)
            .unwrap()
            .typed::<Uint16>()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(read, values);
    }

    #[test]
    fn test_wrong_static_type() {
        let tree = subtree_fill_to_contents(&pack_ints_to_chunks(&[Uint16(1)]), 0).unwrap();
        let mut iter = PackedIter::new(tree, 0, BasicKind::Uint16, 1)
            .unwrap()
            .typed::<crate::basic::Uint8>();
        assert!(iter.next().unwrap().is_err());
    }
}
