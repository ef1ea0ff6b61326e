//! Balanced subtree construction with zero padding

use super::{zero_node, Node};
use crate::{Error, Result};

/// Number of bottom nodes in a perfect tree of the given depth, saturating
pub(crate) fn capacity(depth: u32) -> u128 {
    1u128.checked_shl(depth).unwrap_or(u128::MAX)
}

fn check_fits(count: u64, depth: u32) -> Result<()> {
    if u128::from(count) > capacity(depth) {
        return Err(Error::TooManyNodes { count, depth });
    }
    Ok(())
}

/// A perfect tree of `depth` with every bottom node set to `bottom`
pub fn subtree_fill_to_depth(bottom: Node, depth: u32) -> Node {
    let mut node = bottom;
    for _ in 0..depth {
        node = Node::pair(node.clone(), node);
    }
    node
}

/// A perfect tree of `depth` whose first `length` bottom nodes are `bottom`
/// and the rest zero
pub fn subtree_fill_to_length(bottom: Node, depth: u32, length: u64) -> Result<Node> {
    check_fits(length, depth)?;
    Ok(fill_to_length(bottom, depth, length))
}

pub(crate) fn fill_to_length(bottom: Node, depth: u32, length: u64) -> Node {
    if length == 0 {
        return zero_node(depth);
    }
    if u128::from(length) == capacity(depth) {
        return subtree_fill_to_depth(bottom, depth);
    }
    // length is strictly between 0 and 2^depth, so depth >= 1 here
    let pivot = capacity(depth - 1);
    if u128::from(length) <= pivot {
        Node::pair(fill_to_length(bottom, depth - 1, length), zero_node(depth - 1))
    } else {
        let rest = length - pivot as u64;
        Node::pair(
            subtree_fill_to_depth(bottom.clone(), depth - 1),
            fill_to_length(bottom, depth - 1, rest),
        )
    }
}

/// A perfect tree of `depth` with `nodes` packed to the left and zero
/// subtrees filling the remainder
pub fn subtree_fill_to_contents(nodes: &[Node], depth: u32) -> Result<Node> {
    check_fits(nodes.len() as u64, depth)?;
    Ok(fill_to_contents(nodes, depth))
}

pub(crate) fn fill_to_contents(nodes: &[Node], depth: u32) -> Node {
    match (nodes, depth) {
        ([], _) => zero_node(depth),
        ([only], 0) => only.clone(),
        _ => {
            let pivot = capacity(depth - 1);
            if nodes.len() as u128 <= pivot {
                Node::pair(fill_to_contents(nodes, depth - 1), zero_node(depth - 1))
            } else {
                let (left, right) = nodes.split_at(pivot as usize);
                Node::pair(
                    fill_to_contents(left, depth - 1),
                    fill_to_contents(right, depth - 1),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Root;
    use crate::tree::Gindex;

    fn leaf(n: u64) -> Node {
        Node::leaf(Root::from_length(n))
    }

    #[test]
    fn test_fill_to_depth() {
        let tree = subtree_fill_to_depth(leaf(1), 3);
        assert_eq!(tree.leaf_iter().count(), 8);
        assert!(tree.leaf_iter().all(|n| n.merkle_root() == Root::from_length(1)));
    }

    #[test]
    fn test_fill_to_length() {
        let tree = subtree_fill_to_length(leaf(1), 2, 3).unwrap();
        let roots: Vec<Root> = tree.leaf_iter().map(|n| n.merkle_root()).collect();
        assert_eq!(
            roots,
            vec![
                Root::from_length(1),
                Root::from_length(1),
                Root::from_length(1),
                Root::ZERO
            ]
        );
        assert!(matches!(
            subtree_fill_to_length(leaf(1), 2, 5),
            Err(Error::TooManyNodes { count: 5, depth: 2 })
        ));
    }

    #[test]
    fn test_fill_to_contents_pads_with_zero() {
        let nodes = vec![leaf(1), leaf(2), leaf(3)];
        let tree = subtree_fill_to_contents(&nodes, 3).unwrap();
        for (i, expected) in [1u64, 2, 3].iter().enumerate() {
            let g = Gindex::from_index(i as u64, 3).unwrap();
            assert_eq!(tree.getter(g).unwrap().merkle_root(), Root::from_length(*expected));
        }
        // the empty right half is the shared zero subtree
        let right = tree.getter(Gindex::new(3).unwrap()).unwrap();
        assert!(Node::ptr_eq(&right, &zero_node(2)));
    }

    #[test]
    fn test_fill_to_contents_bounds() {
        assert!(subtree_fill_to_contents(&[leaf(1), leaf(2)], 0).is_err());
        let single = subtree_fill_to_contents(&[leaf(1)], 0).unwrap();
        assert_eq!(single.merkle_root(), Root::from_length(1));
        let empty = subtree_fill_to_contents(&[], 4).unwrap();
        assert!(Node::ptr_eq(&empty, &zero_node(4)));
    }
}
