//! Composite elements and container fields as views

use super::NodeIter;
use crate::tree::{depth_for, Node};
use crate::view::{ContainerDef, TypeDef, View};
use crate::{Error, Result};
use std::sync::Arc;

fn composite_only(elem: &TypeDef) -> Result<()> {
    if elem.is_basic() {
        return Err(Error::UnsupportedOperation(format!(
            "{} elements are packed, iterate them as scalars",
            elem
        )));
    }
    Ok(())
}

/// Yields a freshly built view per element
pub struct ViewIter {
    nodes: NodeIter,
    elem: TypeDef,
}

impl ViewIter {
    pub fn new(anchor: Node, depth: u32, elem: TypeDef, length: u64) -> Result<Self> {
        composite_only(&elem)?;
        Ok(ViewIter {
            nodes: NodeIter::new(anchor, depth, length)?,
            elem,
        })
    }
}

impl Iterator for ViewIter {
    type Item = Result<View>;

    fn next(&mut self) -> Option<Result<View>> {
        let node = self.nodes.next()?;
        Some(node.and_then(|n| self.elem.view_from_backing(n)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

/// Walks the elements with a single view whose backing is swapped at every
/// step, so nothing is allocated per element.
///
/// The view is lent out, hence `next_view` instead of `Iterator`.
pub struct RebindIter {
    nodes: NodeIter,
    view: View,
}

impl RebindIter {
    pub fn new(anchor: Node, depth: u32, elem: TypeDef, length: u64) -> Result<Self> {
        composite_only(&elem)?;
        Ok(RebindIter {
            nodes: NodeIter::new(anchor, depth, length)?,
            view: elem.default_view(),
        })
    }

    pub fn next_view(&mut self) -> Option<Result<&View>> {
        let node = match self.nodes.next()? {
            Ok(node) => node,
            Err(e) => return Some(Err(e)),
        };
        Some(self.view.rebind(node).map(|()| &self.view))
    }
}

/// Yields each container field as a view of its declared type
pub struct FieldIter {
    nodes: NodeIter,
    def: Arc<ContainerDef>,
    index: usize,
}

impl FieldIter {
    pub fn new(anchor: Node, def: Arc<ContainerDef>) -> Result<Self> {
        let count = def.fields.len() as u64;
        Ok(FieldIter {
            nodes: NodeIter::new(anchor, depth_for(count), count)?,
            def,
            index: 0,
        })
    }

    /// Name of the field the next item belongs to
    pub fn next_name(&self) -> Option<&str> {
        self.def.fields.get(self.index).map(|(name, _)| name.as_str())
    }
}

impl Iterator for FieldIter {
    type Item = Result<View>;

    fn next(&mut self) -> Option<Result<View>> {
        let node = self.nodes.next()?;
        let (_, typ) = self.def.fields.get(self.index)?;
        self.index += 1;
        Some(node.and_then(|n| typ.view_from_backing(n)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Uint64;
    use crate::bytes::ByteVector;
    use crate::hash::Root;
    use crate::tree::zero_node;
    use crate::view::TreeBacked;

    fn roots_type() -> TypeDef {
        TypeDef::vector(TypeDef::byte_vector(32).unwrap(), 5).unwrap()
    }

    fn roots() -> Vec<View> {
        (0..5u8)
            .map(|i| View::ByteVector(ByteVector::new(vec![i; 32]).unwrap()))
            .collect()
    }

    #[test]
    fn test_fresh_and_rebound_agree() {
        let view = roots_type().from_elements(roots()).unwrap();
        let backing = view.get_backing();
        let elem = TypeDef::byte_vector(32).unwrap();
        let fresh: Vec<View> = ViewIter::new(backing.clone(), 3, elem.clone(), 5)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(fresh, roots());

        let mut rebound = RebindIter::new(backing, 3, elem, 5).unwrap();
        let mut seen = Vec::new();
        while let Some(view) = rebound.next_view() {
            seen.push(view.unwrap().hash_tree_root());
        }
        let expected: Vec<_> = roots().iter().map(|v| v.hash_tree_root()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_basic_elements_rejected() {
        let anchor = TypeDef::uint64().default_node();
        assert!(ViewIter::new(anchor.clone(), 0, TypeDef::uint64(), 1).is_err());
        assert!(RebindIter::new(anchor, 0, TypeDef::uint64(), 1).is_err());
    }

    #[test]
    fn test_fields() {
        let typ = TypeDef::container(
            "Slot",
            vec![("epoch", TypeDef::uint64()), ("root", TypeDef::byte_vector(32).unwrap())],
        )
        .unwrap();
        let view = typ
            .from_elements(vec![
                View::Basic(Uint64(3).into()),
                View::ByteVector(ByteVector::new(vec![7u8; 32]).unwrap()),
            ])
            .unwrap();
        let TypeDef::Container(def) = typ else { unreachable!() };
        let mut fields = FieldIter::new(view.get_backing(), def).unwrap();
        assert_eq!(fields.next_name(), Some("epoch"));
        assert_eq!(fields.next().unwrap().unwrap(), View::Basic(Uint64(3).into()));
        assert_eq!(fields.next_name(), Some("root"));
        assert!(fields.next().unwrap().unwrap().as_bytes().is_some());
        assert!(fields.next().is_none());
    }

    #[test]
    fn test_rebind_checks_backing() {
        let elem = TypeDef::list(TypeDef::uint64(), 2);
        let too_long = Node::pair(zero_node(0), Node::leaf(Root::from_length(5)));
        let anchor = Node::pair(elem.default_node(), too_long);

        let mut rebound = RebindIter::new(anchor.clone(), 1, elem.clone(), 2).unwrap();
        assert!(rebound.next_view().unwrap().is_ok());
        assert!(matches!(
            rebound.next_view(),
            Some(Err(Error::LimitExceeded { length: 5, limit: 2 }))
        ));

        let mut fresh = ViewIter::new(anchor, 1, elem.clone(), 2).unwrap();
        assert!(fresh.next().unwrap().is_ok());
        assert!(matches!(fresh.next(), Some(Err(Error::LimitExceeded { .. }))));

        // a list needs a pair for its length mix-in
        let flat = Node::pair(zero_node(0), zero_node(0));
        let mut rebound = RebindIter::new(flat, 1, elem, 2).unwrap();
        assert!(matches!(rebound.next_view(), Some(Err(Error::Navigation(_)))));
    }
}
