//! Canonical all-zero subtrees

use super::Node;
use crate::hash::Root;
use crate::ZERO_HASHES_DEPTH;
use once_cell::sync::Lazy;

/// `ZERO_NODES[d]` is the all-zero subtree of depth `d`, with its root precomputed
static ZERO_NODES: Lazy<Vec<Node>> = Lazy::new(|| {
    let mut nodes = Vec::with_capacity(ZERO_HASHES_DEPTH as usize + 1);
    let mut node = Node::leaf(Root::ZERO);
    let mut root = Root::ZERO;
    nodes.push(node.clone());
    for _ in 0..ZERO_HASHES_DEPTH {
        root = Root::combine(&root, &root);
        node = Node::pair_with_root(node.clone(), node, root);
        nodes.push(node.clone());
    }
    nodes
});

/// The zero subtree of the given depth.
///
/// Every call for the same depth returns the same shared node. Depths past
/// the table are stacked on top of its deepest entry.
pub fn zero_node(depth: u32) -> Node {
    if let Some(node) = ZERO_NODES.get(depth as usize) {
        return node.clone();
    }
    let mut node = ZERO_NODES[ZERO_HASHES_DEPTH as usize].clone();
    for _ in ZERO_HASHES_DEPTH..depth {
        node = Node::pair(node.clone(), node);
    }
    node
}

/// Root of the zero subtree of the given depth
pub fn zero_root(depth: u32) -> Root {
    zero_node(depth).merkle_root()
}
