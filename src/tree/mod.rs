//! Persistent binary Merkle trees
//!
//! - Every node's root is derived from its children's roots
//! - Unchanged subtrees are shared between versions of a tree
//! - Nodes are addressed by generalized index, the root being 1

mod build;
mod gindex;
mod node;
mod zero;

pub(crate) use build::{capacity, fill_to_contents, fill_to_length};
pub use build::{subtree_fill_to_contents, subtree_fill_to_depth, subtree_fill_to_length};
pub use gindex::{depth_for, Gindex, GindexBits, MAX_GINDEX_DEPTH};
pub use node::{LeafIter, Link, Node, SummaryLink};
pub use zero::{zero_node, zero_root};
