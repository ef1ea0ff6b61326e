//! Chunk packing: the one place byte order is decided
//!
//! Values are laid out little-endian, left to right, and the last chunk is
//! zero padded.

use crate::basic::BasicType;
use crate::hash::Root;
use crate::iter::NodeIter;
use crate::tree::Node;
use crate::{Result, BYTES_PER_CHUNK};

/// Split raw bytes into 32-byte leaves. No bytes, no chunks.
pub fn pack_bytes_to_chunks(bytes: &[u8]) -> Vec<Node> {
    bytes
        .chunks(BYTES_PER_CHUNK)
        .map(|chunk| {
            let mut buf = [0u8; BYTES_PER_CHUNK];
            buf[..chunk.len()].copy_from_slice(chunk);
            Node::leaf(Root::from_bytes(buf))
        })
        .collect()
}

pub fn pack_ints_to_chunks<T: BasicType>(values: &[T]) -> Vec<Node> {
    let size = T::KIND.byte_length();
    let mut bytes = vec![0u8; values.len() * size];
    for (value, slot) in values.iter().zip(bytes.chunks_exact_mut(size)) {
        value.write_le(slot);
    }
    pack_bytes_to_chunks(&bytes)
}

/// Bit `i` goes to bit `i % 8` of byte `i / 8`
pub fn pack_bits_to_chunks(bits: &[bool]) -> Vec<Node> {
    pack_bytes_to_chunks(&bits_to_bytes(bits))
}

pub(crate) fn bits_to_bytes(bits: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; bits.len().div_ceil(8)];
    for (i, bit) in bits.iter().enumerate() {
        if *bit {
            bytes[i / 8] |= 1 << (i % 8);
        }
    }
    bytes
}

/// Read `byte_len` bytes back out of the chunks at the bottom of a
/// `depth`-deep subtree
pub fn unpack_bytes_from_chunks(node: &Node, depth: u32, byte_len: usize) -> Result<Vec<u8>> {
    let chunks = byte_len.div_ceil(BYTES_PER_CHUNK);
    let mut out = Vec::with_capacity(chunks * BYTES_PER_CHUNK);
    for chunk in NodeIter::new(node.clone(), depth, chunks as u64)? {
        out.extend_from_slice(chunk?.merkle_root().as_bytes());
    }
    out.truncate(byte_len);
    Ok(out)
}
