//! Bits of a bitfield, 256 per chunk

use super::NodeIter;
use crate::hash::Root;
use crate::tree::Node;
use crate::view::bits_chunk_count;
use crate::Result;

const BITS_PER_CHUNK: u64 = 256;

/// Yields `length` bits packed 256 per chunk, least significant bit of
/// each byte first
pub struct BitIter {
    chunks: NodeIter,
    current: Root,
    length: u64,
    index: u64,
}

impl BitIter {
    pub fn new(anchor: Node, depth: u32, length: u64) -> Result<Self> {
        Ok(BitIter {
            chunks: NodeIter::new(anchor, depth, bits_chunk_count(length))?,
            current: Root::ZERO,
            length,
            index: 0,
        })
    }
}

impl Iterator for BitIter {
    type Item = Result<bool>;

    fn next(&mut self) -> Option<Result<bool>> {
        if self.index >= self.length {
            return None;
        }
        let offset = self.index % BITS_PER_CHUNK;
        if offset == 0 {
            match self.chunks.next()? {
                Ok(chunk) => self.current = chunk.merkle_root(),
                Err(e) => {
                    self.index = self.length;
                    return Some(Err(e));
                }
            }
        }
        self.index += 1;
        let byte = self.current.as_bytes()[(offset / 8) as usize];
        Some(Ok((byte >> (offset % 8)) & 1 == 1))
    }
}
