//! Diff operations between tree states

use crate::tree::{Gindex, Node, MAX_GINDEX_DEPTH};
use crate::{Error, Result};

/// A pair of subtrees whose roots differ, at the same position in both trees
#[derive(Clone, Debug)]
pub struct DiffEntry {
    pub gindex: Gindex,
    pub old: Node,
    pub new: Node,
}

/// A diff between two tree states
#[derive(Clone, Debug, Default)]
pub struct Diff {
    pub entries: Vec<DiffEntry>,
}

impl Diff {
    pub fn new(entries: Vec<DiffEntry>) -> Self {
        Diff { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn gindices(&self) -> impl Iterator<Item = Gindex> + '_ {
        self.entries.iter().map(|e| e.gindex)
    }
}

/// Compute the diff between two trees.
///
/// Descent stops as soon as either side is a leaf, even when the other side
/// is still a pair: the entry then covers the whole differing subtree.
/// Entries are ordered left to right.
///
/// Trees of any depth can be compared, but a difference deeper than
/// [`MAX_GINDEX_DEPTH`] has no gindex and fails with a navigation error.
pub fn diff_trees(old: &Node, new: &Node) -> Result<Diff> {
    let mut entries = Vec::new();
    let mut stack = vec![(Gindex::ROOT, old.clone(), new.clone())];

    while let Some((gindex, a, b)) = stack.pop() {
        if Node::ptr_eq(&a, &b) || a.merkle_root() == b.merkle_root() {
            continue;
        }
        match (a.children(), b.children()) {
            (Some((al, ar)), Some((bl, br))) => {
                if gindex.depth() >= MAX_GINDEX_DEPTH {
                    return Err(Error::navigation(format!(
                        "trees differ below depth {}, past the gindex range",
                        MAX_GINDEX_DEPTH
                    )));
                }
                stack.push((gindex.right()?, ar.clone(), br.clone()));
                stack.push((gindex.left()?, al.clone(), bl.clone()));
            }
            _ => entries.push(DiffEntry {
                gindex,
                old: a,
                new: b,
            }),
        }
    }

    Ok(Diff::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Root;
    use crate::tree::{subtree_fill_to_contents, zero_node};

    fn leaf(n: u64) -> Node {
        Node::leaf(Root::from_length(n))
    }

    #[test]
    fn test_diff_same_trees() {
        let tree = subtree_fill_to_contents(&[leaf(1), leaf(2)], 2).unwrap();
        assert!(diff_trees(&tree, &tree).unwrap().is_empty());
    }

    #[test]
    fn test_diff_single_leaf() {
        let old = subtree_fill_to_contents(&[leaf(1), leaf(2), leaf(3)], 2).unwrap();
        let new = old.set(Gindex::new(5).unwrap(), false, leaf(9)).unwrap();

        let diff = diff_trees(&old, &new).unwrap();
        assert_eq!(diff.len(), 1);
        let entry = &diff.entries[0];
        assert_eq!(entry.gindex.value(), 5);
        assert_eq!(entry.old.merkle_root(), Root::from_length(2));
        assert_eq!(entry.new.merkle_root(), Root::from_length(9));
    }

    #[test]
    fn test_diff_stops_at_leaf() {
        let old = zero_node(3);
        let new = Node::pair(leaf(1), zero_node(2));
        let diff = diff_trees(&old, &new).unwrap();
        assert_eq!(diff.len(), 1);
        // left side is a pair on one tree and a leaf on the other
        assert_eq!(diff.entries[0].gindex.value(), 2);
        assert!(!diff.entries[0].old.is_leaf());
        assert!(diff.entries[0].new.is_leaf());
    }

    #[test]
    fn test_diff_ordered_left_to_right() {
        let old = subtree_fill_to_contents(&[leaf(1), leaf(2), leaf(3), leaf(4)], 2).unwrap();
        let new = subtree_fill_to_contents(&[leaf(5), leaf(2), leaf(3), leaf(6)], 2).unwrap();
        let gindices: Vec<u128> = diff_trees(&old, &new)
            .unwrap()
            .gindices()
            .map(|g| g.value())
            .collect();
        assert_eq!(gindices, vec![4, 7]);
    }

    fn chain(bottom: Node, depth: u32) -> Node {
        (0..depth).fold(bottom, |node, _| Node::pair(node, zero_node(0)))
    }

    #[test]
    fn test_diff_past_gindex_range() {
        let deep = chain(leaf(1), MAX_GINDEX_DEPTH + 3);
        // a shallow difference between deep trees is still reported
        let old = Node::pair(deep.clone(), leaf(1));
        let new = Node::pair(deep.clone(), leaf(2));
        let gindices: Vec<u128> = diff_trees(&old, &new)
            .unwrap()
            .gindices()
            .map(|g| g.value())
            .collect();
        assert_eq!(gindices, vec![3]);

        let other = chain(leaf(2), MAX_GINDEX_DEPTH + 3);
        assert!(matches!(diff_trees(&deep, &other), Err(Error::Navigation(_))));
    }
}
