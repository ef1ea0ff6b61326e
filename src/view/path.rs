//! Multi-step access paths and their generalized indices

use super::{Key, Navigable, TypeDef, View};
use crate::tree::Gindex;
use crate::{Error, Result};
use std::fmt;

/// A chain of keys from an anchor type, each step resolved to its type
#[derive(Clone, PartialEq, Eq)]
pub struct Path {
    anchor: TypeDef,
    steps: Vec<(Key, TypeDef)>,
}

impl Path {
    pub fn new(anchor: TypeDef) -> Self {
        Path {
            anchor,
            steps: Vec::new(),
        }
    }

    /// Extend by one key
    pub fn at(&self, key: impl Into<Key>) -> Result<Path> {
        let key = key.into();
        let typ = self.type_def().navigate_type(&key)?;
        let mut steps = self.steps.clone();
        steps.push((key, typ));
        Ok(Path {
            anchor: self.anchor.clone(),
            steps,
        })
    }

    pub fn anchor(&self) -> &TypeDef {
        &self.anchor
    }

    /// Type at the end of the path
    pub fn type_def(&self) -> &TypeDef {
        self.steps.last().map_or(&self.anchor, |(_, t)| t)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.steps.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Gindex of the path's target, relative to the anchor.
    ///
    /// Without a view only the types are consulted. With one, every step is
    /// checked against the instance, so list lengths and union selectors
    /// in effect at run time are honored.
    pub fn gindex(&self, view: Option<&View>) -> Result<Gindex> {
        let mut parts = Vec::with_capacity(self.steps.len());
        match view {
            None => {
                let mut typ = &self.anchor;
                for (key, next) in &self.steps {
                    parts.push(typ.key_to_static_gindex(key)?);
                    typ = next;
                }
            }
            Some(view) => {
                if view.type_def() != self.anchor {
                    return Err(Error::UnsupportedOperation(format!(
                        "path from {} applied to a {}",
                        self.anchor,
                        view.type_def()
                    )));
                }
                let mut current = view.clone();
                for (i, (key, _)) in self.steps.iter().enumerate() {
                    parts.push(current.key_to_dynamic_gindex(key)?);
                    if i + 1 < self.steps.len() {
                        current = current.navigate_view(key)?;
                    }
                }
            }
        }
        Gindex::concat(&parts)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.anchor)?;
        for key in self.keys() {
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Uint64;
    use crate::tree::Node;
    use crate::view::TreeBacked;

    fn outer() -> TypeDef {
        let inner = TypeDef::container(
            "Inner",
            vec![("x", TypeDef::uint64()), ("ys", TypeDef::list(TypeDef::uint64(), 16))],
        )
        .unwrap();
        TypeDef::container("Outer", vec![("a", TypeDef::uint8()), ("inner", inner)]).unwrap()
    }

    #[test]
    fn test_static_gindex() {
        let path = Path::new(outer()).at("inner").unwrap().at("ys").unwrap().at(5u64).unwrap();
        // inner = 3, ys = 3 inside it, element 5 = chunk 1 of depth 2 under the mix-in = 9
        assert_eq!(path.gindex(None).unwrap().value(), 0b11_1001);
        assert_eq!(path.type_def(), &TypeDef::uint64());
        assert_eq!(path.to_string(), "Outer.inner.ys[5]");
        assert!(Path::new(outer()).at("missing").is_err());
        assert_eq!(Path::new(outer()).gindex(None).unwrap(), Gindex::ROOT);
    }

    #[test]
    fn test_dynamic_gindex_checks_length() {
        let typ = outer();
        let view = typ.default_view();
        let path = Path::new(typ).at("inner").unwrap().at("ys").unwrap().at(0u64).unwrap();
        assert!(path.gindex(Some(&view)).is_err());
        let len = Path::new(outer())
            .at("inner")
            .unwrap()
            .at("ys")
            .unwrap()
            .at(crate::view::Key::Length)
            .unwrap();
        assert_eq!(len.gindex(Some(&view)).unwrap(), len.gindex(None).unwrap());
    }

    #[test]
    fn test_gindex_reaches_value() {
        let list_type = TypeDef::list(TypeDef::uint64(), 16);
        let values: Vec<View> = (0..6u64).map(|i| View::Basic(Uint64(i * 10).into())).collect();
        let list = list_type.from_elements(values).unwrap();
        let path = Path::new(list_type).at(5u64).unwrap();
        let g = path.gindex(Some(&list)).unwrap();
        let chunk: Node = list.get_backing().getter(g).unwrap();
        assert_eq!(&chunk.merkle_root().as_bytes()[8..16], &50u64.to_le_bytes());
    }

    #[test]
    fn test_wrong_anchor() {
        let path = Path::new(outer());
        let other = TypeDef::uint8().default_view();
        assert!(path.gindex(Some(&other)).is_err());
    }
}
