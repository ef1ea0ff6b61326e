//! Persistent binary tree nodes
//!
//! Nodes are immutable and reference counted. A "write" never touches an
//! existing node: it rebuilds the path from the root down to the target and
//! shares every sibling subtree with the previous version.

use super::{zero_node, Gindex};
use crate::hash::Root;
use crate::{Error, Result};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// A node in a binary Merkle tree: a 32-byte leaf or a pair of children
#[derive(Clone)]
pub struct Node(Arc<NodeKind>);

enum NodeKind {
    Leaf(Root),
    Pair {
        left: Node,
        right: Node,
        /// Memoized `combine(left, right)`, written at most once
        root: OnceCell<Root>,
    },
}

impl Node {
    /// Create a leaf holding a 32-byte chunk
    pub fn leaf(root: Root) -> Self {
        Node(Arc::new(NodeKind::Leaf(root)))
    }

    /// Create an internal node over two children
    pub fn pair(left: Node, right: Node) -> Self {
        Node(Arc::new(NodeKind::Pair {
            left,
            right,
            root: OnceCell::new(),
        }))
    }

    /// Create an internal node whose root is already known
    pub(crate) fn pair_with_root(left: Node, right: Node, root: Root) -> Self {
        Node(Arc::new(NodeKind::Pair {
            left,
            right,
            root: OnceCell::with_value(root),
        }))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(*self.0, NodeKind::Leaf(_))
    }

    /// Both children, or `None` for a leaf
    pub fn children(&self) -> Option<(&Node, &Node)> {
        match &*self.0 {
            NodeKind::Leaf(_) => None,
            NodeKind::Pair { left, right, .. } => Some((left, right)),
        }
    }

    pub fn get_left(&self) -> Result<&Node> {
        self.children()
            .map(|(left, _)| left)
            .ok_or_else(|| Error::navigation("cannot get the left child of a leaf"))
    }

    pub fn get_right(&self) -> Result<&Node> {
        self.children()
            .map(|(_, right)| right)
            .ok_or_else(|| Error::navigation("cannot get the right child of a leaf"))
    }

    /// The content-addressed commitment to this subtree
    pub fn merkle_root(&self) -> Root {
        match &*self.0 {
            NodeKind::Leaf(root) => *root,
            NodeKind::Pair { left, right, root } => {
                *root.get_or_init(|| Root::combine(&left.merkle_root(), &right.merkle_root()))
            }
        }
    }

    /// Whether two handles point at the very same node
    pub fn ptr_eq(a: &Node, b: &Node) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Fetch the node at `target`, relative to this node
    pub fn getter(&self, target: Gindex) -> Result<Node> {
        let mut node = self;
        for right in target.bit_iter() {
            node = match node.children() {
                Some((l, r)) => {
                    if right {
                        r
                    } else {
                        l
                    }
                }
                None => {
                    return Err(Error::navigation(format!(
                        "gindex {} descends into a leaf",
                        target
                    )))
                }
            };
        }
        Ok(node.clone())
    }

    /// Prepare a replacement of the node at `target`.
    ///
    /// With `expand`, leaves met on the way are treated as zero subtrees and
    /// split, so a write can reach below the current shape of the tree.
    pub fn setter(&self, target: Gindex, expand: bool) -> Result<Link> {
        let depth = target.depth();
        let mut siblings = Vec::with_capacity(depth as usize);
        let mut node = self.clone();
        for (level, right) in target.bit_iter().enumerate() {
            let (left_child, right_child) = match node.children() {
                Some((l, r)) => (l.clone(), r.clone()),
                None if expand => {
                    let zero = zero_node(depth - level as u32 - 1);
                    (zero.clone(), zero)
                }
                None => {
                    return Err(Error::navigation(format!(
                        "gindex {} descends into a leaf at depth {}",
                        target, level
                    )))
                }
            };
            if right {
                siblings.push((true, left_child));
                node = right_child;
            } else {
                siblings.push((false, right_child));
                node = left_child;
            }
        }
        Ok(Link { siblings })
    }

    /// Shorthand for `setter(target, expand)?.apply(value)`
    pub fn set(&self, target: Gindex, expand: bool, value: Node) -> Result<Node> {
        Ok(self.setter(target, expand)?.apply(value))
    }

    /// Prepare a copy of this tree where the subtree at `target` is
    /// replaced by a leaf holding its root
    pub fn summarize_into(&self, target: Gindex) -> Result<SummaryLink> {
        let summary = Node::leaf(self.getter(target)?.merkle_root());
        let link = self.setter(target, false)?;
        Ok(SummaryLink { link, summary })
    }

    /// All leaves, left to right
    pub fn leaf_iter(&self) -> LeafIter {
        LeafIter {
            stack: vec![self.clone()],
        }
    }
}

impl From<Root> for Node {
    fn from(root: Root) -> Self {
        Node::leaf(root)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            NodeKind::Leaf(root) => write!(f, "Leaf({})", root.short()),
            NodeKind::Pair { left, right, .. } => f
                .debug_tuple("Pair")
                .field(left)
                .field(right)
                .finish(),
        }
    }
}

/// A rebuild path produced by [`Node::setter`]
///
/// Holds the sibling of every node on the root-to-target path; applying it to
/// a replacement node yields the new root.
#[derive(Clone, Debug)]
pub struct Link {
    /// From the root down: whether the path went right, and the other child
    siblings: Vec<(bool, Node)>,
}

impl Link {
    pub fn apply(&self, value: Node) -> Node {
        self.siblings
            .iter()
            .rev()
            .fold(value, |node, (right, sibling)| {
                if *right {
                    Node::pair(sibling.clone(), node)
                } else {
                    Node::pair(node, sibling.clone())
                }
            })
    }
}

/// A deferred summarization produced by [`Node::summarize_into`]
#[derive(Clone, Debug)]
pub struct SummaryLink {
    link: Link,
    summary: Node,
}

impl SummaryLink {
    pub fn apply(self) -> Node {
        self.link.apply(self.summary)
    }
}

/// Depth-first, left-to-right leaf walk
pub struct LeafIter {
    stack: Vec<Node>,
}

impl Iterator for LeafIter {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        while let Some(node) = self.stack.pop() {
            match node.children() {
                Some((left, right)) => {
                    self.stack.push(right.clone());
                    self.stack.push(left.clone());
                }
                None => return Some(node),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(n: u64) -> Node {
        Node::leaf(Root::from_length(n))
    }

    /// Depth-2 tree with leaves 1, 2, 3, 4
    fn sample() -> Node {
        Node::pair(Node::pair(leaf(1), leaf(2)), Node::pair(leaf(3), leaf(4)))
    }

    fn g(v: u128) -> Gindex {
        Gindex::new(v).unwrap()
    }

    #[test]
    fn test_merkle_root_of_pair() {
        let node = Node::pair(leaf(1), leaf(2));
        let expected = Root::combine(&Root::from_length(1), &Root::from_length(2));
        assert_eq!(node.merkle_root(), expected);
        // memoized value stays the same
        assert_eq!(node.merkle_root(), expected);
    }

    #[test]
    fn test_leaf_has_no_children() {
        assert!(leaf(1).is_leaf());
        assert!(matches!(leaf(1).get_left(), Err(Error::Navigation(_))));
        assert!(matches!(leaf(1).get_right(), Err(Error::Navigation(_))));
    }

    #[test]
    fn test_getter() {
        let tree = sample();
        assert!(Node::ptr_eq(&tree.getter(Gindex::ROOT).unwrap(), &tree));
        assert_eq!(tree.getter(g(6)).unwrap().merkle_root(), Root::from_length(3));
        assert!(tree.getter(g(8)).is_err());
    }

    #[test]
    fn test_setter_shares_siblings() {
        let tree = sample();
        let updated = tree.setter(g(5), false).unwrap().apply(leaf(9));
        assert_eq!(updated.getter(g(5)).unwrap().merkle_root(), Root::from_length(9));
        // untouched subtrees are the very same nodes
        assert!(Node::ptr_eq(
            &updated.getter(g(3)).unwrap(),
            &tree.getter(g(3)).unwrap()
        ));
        assert!(Node::ptr_eq(
            &updated.getter(g(4)).unwrap(),
            &tree.getter(g(4)).unwrap()
        ));
        // the original is unchanged
        assert_eq!(tree.getter(g(5)).unwrap().merkle_root(), Root::from_length(2));
    }

    #[test]
    fn test_setter_root_replaces_everything() {
        let tree = sample();
        let replaced = tree.set(Gindex::ROOT, false, leaf(7)).unwrap();
        assert_eq!(replaced.merkle_root(), Root::from_length(7));
    }

    #[test]
    fn test_setter_expand() {
        let tree = Node::leaf(Root::ZERO);
        assert!(tree.setter(g(5), false).is_err());
        let grown = tree.set(g(5), true, leaf(1)).unwrap();
        let expected = Node::pair(Node::pair(Node::leaf(Root::ZERO), leaf(1)), zero_node(1));
        assert_eq!(grown.merkle_root(), expected.merkle_root());
    }

    #[test]
    fn test_summarize_into() {
        let tree = sample();
        let left_root = tree.getter(g(2)).unwrap().merkle_root();
        let summarized = tree.summarize_into(g(2)).unwrap().apply();
        assert!(summarized.getter(g(2)).unwrap().is_leaf());
        assert_eq!(summarized.getter(g(2)).unwrap().merkle_root(), left_root);
        assert_eq!(summarized.merkle_root(), tree.merkle_root());
    }

    #[test]
    fn test_leaf_iter() {
        let roots: Vec<Root> = sample().leaf_iter().map(|n| n.merkle_root()).collect();
        let expected: Vec<Root> = (1..=4).map(Root::from_length).collect();
        assert_eq!(roots, expected);
    }
}
