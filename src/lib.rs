//! # ssz_tree
//!
//! Typed values stored as persistent binary Merkle trees, encoded with SSZ.
//!
//! Every value can be written to and read from a flat byte string, and is
//! also a tree whose root commits to its contents. Writes are persistent:
//! they rebuild only the path to the changed node and share everything else
//! with the previous version.
//!
//! ## Core Concepts
//!
//! - **Gindex**: address of a node, the root being 1
//! - **Node**: an immutable leaf chunk or pair of children with a cached root
//! - **TypeDef**: what a type looks like without an instance
//! - **View**: a type bound to a backing tree
//! - **ViewArena**: views linked to their parents so writes reach the root
//!
//! ## Example
//!
//! ```ignore
//! use ssz_tree::{TypeDef, View, ViewArena, Uint64};
//!
//! let balances = TypeDef::list(TypeDef::uint64(), 1 << 40);
//! let mut arena = ViewArena::new();
//! let id = arena.insert(balances.default_view());
//! arena.append(id, View::Basic(Uint64(32).into()))?;
//! let root = arena.get(id)?.hash_tree_root();
//! ```

pub mod basic;
pub mod bytes;
pub mod iter;
pub mod ops;
pub mod tree;
pub mod view;

mod error;
mod hash;

pub use basic::{
    BasicKind, BasicType, BasicValue, BinaryOp, Boolean, SafeArith, ShiftOp, Uint128, Uint16,
    Uint256, Uint32, Uint64, Uint8, UnaryOp,
};
pub use crate::bytes::{ByteList, ByteVector};
pub use error::{Error, Result};
pub use hash::Root;
pub use iter::{BitIter, FieldIter, NodeIter, PackedIter, RebindIter, ViewIter};
pub use ops::{diff_trees, Diff, DiffEntry};
pub use tree::{Gindex, Node};
pub use view::{
    CompositeView, ContainerDef, Encodable, Key, Navigable, Path, TreeBacked, TypeDef, View,
    ViewArena, ViewId,
};

/// Size of a leaf chunk in bytes
pub const BYTES_PER_CHUNK: usize = 32;

/// Size of a variable-part offset in bytes
pub const BYTES_PER_LENGTH_OFFSET: usize = 4;

/// Depth up to which zero subtrees are tabulated
pub const ZERO_HASHES_DEPTH: u32 = 100;
