//! Types and views
//!
//! A [`TypeDef`] answers every question that needs no instance: byte-length
//! bounds, tree depth, default tree and static navigation. A [`View`] binds a
//! type to a backing [`Node`] and answers the rest. Views are values; to get
//! writes that propagate from a child into its ancestors, keep views in a
//! [`ViewArena`].

mod arena;
mod codec;
mod key;
mod pack;
mod path;
mod types;
mod value;

pub use arena::{ViewArena, ViewId};
pub use key::Key;
pub use pack::{
    pack_bits_to_chunks, pack_bytes_to_chunks, pack_ints_to_chunks, unpack_bytes_from_chunks,
};
pub use path::Path;
pub use types::{ContainerDef, TypeDef, MAX_UNION_OPTIONS};
pub use value::{CompositeView, View};

pub(crate) use types::{bits_chunk_count, packed_chunk_count, Layout};

use crate::hash::Root;
use crate::tree::{Gindex, Node};
use crate::{Error, Result};

/// Values with an SSZ byte encoding
pub trait Encodable {
    /// Append the encoding to `out`
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<()>;

    fn encode_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode_into(&mut out)?;
        Ok(out)
    }
}

/// Values with a Merkle tree representation
pub trait TreeBacked {
    fn get_backing(&self) -> Node;

    /// Replace the backing tree. Values that derive their tree from their
    /// contents refuse.
    fn set_backing(&mut self, _node: Node) -> Result<()> {
        Err(Error::UnsupportedMutation(
            "this view has no replaceable backing".into(),
        ))
    }

    fn hash_tree_root(&self) -> Root {
        self.get_backing().merkle_root()
    }
}

/// Instance-level navigation, which may depend on run-time lengths
pub trait Navigable {
    fn navigate_view(&self, key: &Key) -> Result<View>;

    fn key_to_dynamic_gindex(&self, key: &Key) -> Result<Gindex>;
}
