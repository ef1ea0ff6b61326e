//! Bottom-node walk in O(depth) memory

use crate::tree::{capacity, Node};
use crate::{Error, Result};

/// Yields the first `length` nodes at the bottom of a `depth`-deep subtree,
/// left to right.
///
/// Only the left spine of the current position is remembered. Moving from
/// element `i - 1` to `i`, the highest bit in which the two indices differ
/// says how many levels to climb before stepping right once and walking
/// left down to the bottom again.
pub struct NodeIter {
    anchor: Node,
    /// `stack[k]` is the ancestor of the current element at level `k`
    stack: Vec<Node>,
    depth: u32,
    length: u64,
    index: u64,
    failed: bool,
}

impl NodeIter {
    pub fn new(anchor: Node, depth: u32, length: u64) -> Result<Self> {
        if u128::from(length) > capacity(depth) {
            return Err(Error::TooManyNodes { count: length, depth });
        }
        Ok(NodeIter {
            stack: vec![anchor.clone(); depth as usize],
            anchor,
            depth,
            length,
            index: 0,
            failed: false,
        })
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    fn step(&mut self, i: u64) -> Result<Node> {
        let depth = self.depth as usize;
        let (mut node, start) = if i == 0 {
            (self.anchor.clone(), 0)
        } else {
            let h = (63 - ((i - 1) ^ i).leading_zeros()) as usize;
            (self.stack[depth - 1 - h].get_right()?.clone(), depth - h)
        };
        for level in start..depth {
            let left = node.get_left()?.clone();
            self.stack[level] = node;
            node = left;
        }
        Ok(node)
    }
}

impl Iterator for NodeIter {
    type Item = Result<Node>;

    fn next(&mut self) -> Option<Result<Node>> {
        if self.failed || self.index >= self.length {
            return None;
        }
        let i = self.index;
        self.index += 1;
        let node = self.step(i);
        self.failed = node.is_err();
        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = usize::try_from(self.length - self.index).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Root;
    use crate::tree::{subtree_fill_to_contents, zero_node};

    fn leaves(n: u64) -> Vec<Node> {
        (0..n).map(|i| Node::leaf(Root::from_length(i + 1))).collect()
    }

    #[test]
    fn test_matches_leaf_walk() {
        for depth in 0..=6u32 {
            for length in 0..=(1u64 << depth) {
                let tree = subtree_fill_to_contents(&leaves(length), depth).unwrap();
                let walked: Vec<Root> = NodeIter::new(tree.clone(), depth, length)
                    .unwrap()
                    .map(|n| n.unwrap().merkle_root())
                    .collect();
                let expected: Vec<Root> = tree
                    .leaf_iter()
                    .take(length as usize)
                    .map(|n| n.merkle_root())
                    .collect();
                assert_eq!(walked, expected, "depth {} length {}", depth, length);
            }
        }
    }

    #[test]
    fn test_too_many_nodes() {
        assert!(matches!(
            NodeIter::new(zero_node(2), 2, 5),
            Err(Error::TooManyNodes { count: 5, depth: 2 })
        ));
    }

    #[test]
    fn test_short_tree_fails_once() {
        // claims depth 2 but is only one level deep
        let shallow = Node::pair(Node::leaf(Root::ZERO), Node::leaf(Root::ZERO));
        let mut iter = NodeIter::new(shallow, 2, 4).unwrap();
        assert!(matches!(iter.next(), Some(Err(Error::Navigation(_)))));
        assert!(iter.next().is_none());
    }
}
