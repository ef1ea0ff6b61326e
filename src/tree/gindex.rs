//! Generalized indices: path addresses into a binary tree rooted at 1

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A generalized index.
///
/// The root is 1, the children of `g` are `2g` and `2g + 1`. The bits below
/// the leading 1 spell the path from the root, most significant bit first,
/// with 0 meaning left and 1 meaning right.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Gindex(u128);

/// Deepest level a 128-bit gindex can address
pub const MAX_GINDEX_DEPTH: u32 = 127;

impl Gindex {
    pub const ROOT: Gindex = Gindex(1);

    pub fn new(value: u128) -> Result<Self> {
        if value == 0 {
            return Err(Error::navigation("gindex must be at least 1"));
        }
        Ok(Gindex(value))
    }

    /// The gindex of the `index`-th node at `depth`
    pub fn from_index(index: u64, depth: u32) -> Result<Self> {
        if depth > MAX_GINDEX_DEPTH {
            return Err(Error::navigation(format!(
                "depth {} exceeds the gindex range",
                depth
            )));
        }
        if u128::from(index) >= 1u128 << depth {
            return Err(Error::navigation(format!(
                "index {} out of range for depth {}",
                index, depth
            )));
        }
        Ok(Gindex((1u128 << depth) | u128::from(index)))
    }

    pub fn value(self) -> u128 {
        self.0
    }

    /// Number of levels below the root
    pub fn depth(self) -> u32 {
        127 - self.0.leading_zeros()
    }

    /// Gindex of the leftmost node at the same depth
    pub fn anchor(self) -> Gindex {
        Gindex(1u128 << self.depth())
    }

    /// Position of this node among the nodes at its depth
    pub fn index_at_depth(self) -> u128 {
        self.0 ^ self.anchor().0
    }

    pub fn left(self) -> Result<Gindex> {
        self.child(false)
    }

    pub fn right(self) -> Result<Gindex> {
        self.child(true)
    }

    fn child(self, right: bool) -> Result<Gindex> {
        if self.depth() >= MAX_GINDEX_DEPTH {
            return Err(Error::navigation(format!("gindex {} cannot descend further", self)));
        }
        Ok(Gindex((self.0 << 1) | u128::from(right)))
    }

    pub fn parent(self) -> Option<Gindex> {
        (self.0 > 1).then(|| Gindex(self.0 >> 1))
    }

    pub fn sibling(self) -> Option<Gindex> {
        (self.0 > 1).then(|| Gindex(self.0 ^ 1))
    }

    pub fn is_left(self) -> bool {
        self.0 & 1 == 0
    }

    /// Iterate the left/right choices from the root down to this node
    pub fn bit_iter(self) -> GindexBits {
        let depth = self.depth();
        GindexBits {
            value: self.0,
            remaining: depth,
            depth,
        }
    }

    /// Concatenate relative gindices: descend into the first, then into the
    /// second relative to that node, and so on.
    pub fn concat(steps: &[Gindex]) -> Result<Gindex> {
        let mut out = 1u128;
        let mut depth = 0u32;
        for step in steps {
            let d = step.depth();
            depth += d;
            if depth > MAX_GINDEX_DEPTH {
                return Err(Error::navigation("concatenated path exceeds the gindex range"));
            }
            out = (out << d) | step.index_at_depth();
        }
        Ok(Gindex(out))
    }
}

impl fmt::Display for Gindex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Gindex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gindex({:#b})", self.0)
    }
}

impl TryFrom<u128> for Gindex {
    type Error = Error;

    fn try_from(value: u128) -> Result<Self> {
        Gindex::new(value)
    }
}

impl<'de> Deserialize<'de> for Gindex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = u128::deserialize(deserializer)?;
        Gindex::new(value).map_err(serde::de::Error::custom)
    }
}

/// Single-pass sequence of path bits; `true` means "go right"
#[derive(Clone, Debug)]
pub struct GindexBits {
    value: u128,
    remaining: u32,
    depth: u32,
}

impl GindexBits {
    /// Total number of steps, i.e. the depth of the target
    pub fn depth(&self) -> u32 {
        self.depth
    }
}

impl Iterator for GindexBits {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some((self.value >> self.remaining) & 1 == 1)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}

impl ExactSizeIterator for GindexBits {}

/// Depth of the smallest perfect tree holding `count` bottom nodes
pub fn depth_for(count: u64) -> u32 {
    if count <= 1 {
        0
    } else {
        64 - (count - 1).leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_for() {
        assert_eq!(depth_for(0), 0);
        assert_eq!(depth_for(1), 0);
        assert_eq!(depth_for(2), 1);
        assert_eq!(depth_for(3), 2);
        assert_eq!(depth_for(4), 2);
        assert_eq!(depth_for(5), 3);
        assert_eq!(depth_for(1 << 40), 40);
        assert_eq!(depth_for((1 << 40) + 1), 41);
    }

    #[test]
    fn test_from_index() {
        assert_eq!(Gindex::from_index(0, 0).unwrap(), Gindex::ROOT);
        assert_eq!(Gindex::from_index(3, 2).unwrap().value(), 7);
        assert!(matches!(
            Gindex::from_index(4, 2),
            Err(Error::Navigation(_))
        ));
    }

    #[test]
    fn test_zero_is_not_a_gindex() {
        assert!(Gindex::new(0).is_err());
    }

    #[test]
    fn test_deserialize_checks_value() {
        assert!(serde_json::from_str::<Gindex>("0").is_err());
        let g: Gindex = serde_json::from_str("13").unwrap();
        assert_eq!(g.depth(), 3);
        let json = serde_json::to_string(&g).unwrap();
        assert_eq!(serde_json::from_str::<Gindex>(&json).unwrap(), g);
    }

    #[test]
    fn test_anchor_and_depth() {
        let g = Gindex::new(13).unwrap();
        assert_eq!(g.depth(), 3);
        assert_eq!(g.anchor().value(), 8);
        assert_eq!(g.index_at_depth(), 5);
    }

    #[test]
    fn test_bit_iter() {
        // 13 = 0b1101: right, left, right
        let bits = Gindex::new(13).unwrap().bit_iter();
        assert_eq!(bits.depth(), 3);
        assert_eq!(bits.collect::<Vec<_>>(), vec![true, false, true]);
        assert_eq!(Gindex::ROOT.bit_iter().count(), 0);
    }

    #[test]
    fn test_concat() {
        let a = Gindex::from_index(0, 1).unwrap();
        let b = Gindex::from_index(1, 1).unwrap();
        assert_eq!(Gindex::concat(&[a, b]).unwrap(), Gindex::from_index(1, 2).unwrap());
        assert_eq!(Gindex::concat(&[]).unwrap(), Gindex::ROOT);
        assert_eq!(Gindex::concat(&[Gindex::ROOT, a]).unwrap(), a);
    }

    #[test]
    fn test_family() {
        let g = Gindex::new(6).unwrap();
        assert_eq!(g.parent().unwrap().value(), 3);
        assert_eq!(g.sibling().unwrap().value(), 7);
        assert!(g.is_left());
        assert_eq!(g.left().unwrap().value(), 12);
        assert_eq!(g.right().unwrap().value(), 13);
        assert!(Gindex::ROOT.parent().is_none());
    }
}
