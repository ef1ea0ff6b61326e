//! Views with write-through to their ancestors
//!
//! A view navigated to from a parent remembers the parent's id and where it
//! sits inside the parent's tree. Replacing its backing rebuilds the parent's
//! backing along that path, and so on up to the root view.

use super::{Key, Layout, Navigable, TreeBacked, TypeDef, View};
use crate::basic::{BasicKind, BasicValue, Boolean, Uint8};
use crate::bytes::check_limit;
use crate::hash::Root;
use crate::tree::{zero_node, Gindex, Node};
use crate::{Error, Result, BYTES_PER_CHUNK};
use std::fmt;

/// Handle to a view held by a [`ViewArena`]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(usize);

impl fmt::Debug for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewId({})", self.0)
    }
}

#[derive(Clone, Debug)]
struct ParentLink {
    parent: ViewId,
    key: Key,
    gindex: Gindex,
}

#[derive(Clone, Debug)]
struct Slot {
    view: View,
    parent: Option<ParentLink>,
}

/// Owns views and the parent links between them.
///
/// Links are plain ids, so there are no reference cycles. A child slot is a
/// snapshot: writes that go through the parent directly, or through another
/// child, do not refresh it.
#[derive(Default)]
pub struct ViewArena {
    slots: Vec<Slot>,
}

impl ViewArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Add a root view with no parent
    pub fn insert(&mut self, view: View) -> ViewId {
        self.slots.push(Slot { view, parent: None });
        ViewId(self.slots.len() - 1)
    }

    pub fn get(&self, id: ViewId) -> Result<&View> {
        self.slot(id).map(|s| &s.view)
    }

    fn slot(&self, id: ViewId) -> Result<&Slot> {
        self.slots
            .get(id.0)
            .ok_or_else(|| Error::navigation(format!("no view with id {}", id.0)))
    }

    /// Parent of a navigated view and the key it was reached by
    pub fn parent(&self, id: ViewId) -> Result<Option<(ViewId, &Key)>> {
        Ok(self.slot(id)?.parent.as_ref().map(|l| (l.parent, &l.key)))
    }

    /// Register the child at `key` as a linked view. Scalars are values
    /// without a backing of their own; read them with [`View::get`] and
    /// write them with [`ViewArena::set_basic`].
    pub fn navigate(&mut self, id: ViewId, key: impl Into<Key>) -> Result<ViewId> {
        let key = key.into();
        let parent = self.get(id)?;
        let child = parent.navigate_view(&key)?;
        if let View::Basic(_) = child {
            return Err(Error::UnsupportedOperation(format!(
                "{} is a scalar and cannot be linked",
                key
            )));
        }
        let gindex = parent.key_to_dynamic_gindex(&key)?;
        self.slots.push(Slot {
            view: child,
            parent: Some(ParentLink {
                parent: id,
                key,
                gindex,
            }),
        });
        Ok(ViewId(self.slots.len() - 1))
    }

    /// Replace the backing of a view and propagate the change to every
    /// ancestor. Nothing is modified if any step fails.
    pub fn set_backing(&mut self, id: ViewId, node: Node) -> Result<()> {
        self.commit(id, node)
    }

    fn commit(&mut self, id: ViewId, node: Node) -> Result<()> {
        let mut updates = vec![(id, node.clone())];
        let mut current = self.slot(id)?;
        let mut node = node;
        while let Some(link) = &current.parent {
            let parent = self.slot(link.parent)?;
            node = parent.view.get_backing().set(link.gindex, false, node)?;
            updates.push((link.parent, node.clone()));
            current = parent;
        }

        let mut views = Vec::with_capacity(updates.len());
        for (id, node) in updates {
            let mut view = self.slots[id.0].view.clone();
            view.rebind(node)?;
            views.push((id, view));
        }
        tracing::trace!(view = id.0, levels = views.len(), "committed backing");
        for (id, view) in views {
            self.slots[id.0].view = view;
        }
        Ok(())
    }

    /// Replace the child at `key`
    pub fn set(&mut self, id: ViewId, key: impl Into<Key>, value: View) -> Result<()> {
        let key = key.into();
        let view = self.get(id)?;
        let typ = view.type_def();
        if let TypeDef::Union(_) = typ {
            return match key {
                Key::Index(i) => {
                    let selector = u8::try_from(i)
                        .map_err(|_| Error::navigation(format!("{} has no option {}", typ, i)))?;
                    self.set_union(id, selector, Some(value))
                }
                other => Err(Error::UnsupportedMutation(format!(
                    "cannot set {} of a union",
                    other
                ))),
            };
        }
        let child_type = typ.navigate_type(&key)?;
        if let (true, View::Basic(v)) = (child_type.is_basic(), &value) {
            return self.set_basic(id, key, *v);
        }
        if let Key::Length = key {
            return Err(Error::UnsupportedMutation(
                "list lengths change through append and pop".into(),
            ));
        }
        let value = child_type.coerce(value)?;
        let gindex = view.key_to_dynamic_gindex(&key)?;
        let node = view.get_backing().set(gindex, false, value.get_backing())?;
        self.commit(id, node)
    }

    /// Write a scalar element or field in place, inside its shared chunk
    pub fn set_basic(&mut self, id: ViewId, key: impl Into<Key>, value: BasicValue) -> Result<()> {
        let key = key.into();
        let view = self.get(id)?;
        let index = match key {
            Key::Index(i) => Some(i),
            _ => None,
        };
        let node = match (view, index) {
            (View::ByteVector(v), Some(i)) => {
                let byte = byte_of(value)?;
                v.with_byte(i, byte)?.get_backing()
            }
            (View::ByteList(v), Some(i)) => {
                let byte = byte_of(value)?;
                v.with_byte(i, byte)?.get_backing()
            }
            (View::Composite(c), _) => {
                if let Key::Length | Key::Selector = key {
                    return Err(Error::UnsupportedMutation(format!(
                        "{} is not written directly",
                        key
                    )));
                }
                let typ = c.type_def();
                let gindex = view.key_to_dynamic_gindex(&key)?;
                let backing = c.backing();
                match (typ.layout(), index) {
                    (Layout::Packed { .. }, Some(i)) | (Layout::Bits { .. }, Some(i)) => {
                        write_element(typ, backing, i, View::Basic(value))?
                    }
                    _ => {
                        let child = typ.navigate_type(&key)?;
                        let value = child.coerce(View::Basic(value))?;
                        backing.set(gindex, false, value.get_backing())?
                    }
                }
            }
            (other, _) => {
                return Err(Error::UnsupportedMutation(format!(
                    "cannot set {} of {}",
                    key,
                    other.type_def()
                )))
            }
        };
        self.commit(id, node)
    }

    /// Switch a union to `selector` holding `value`
    pub fn set_union(&mut self, id: ViewId, selector: u8, value: Option<View>) -> Result<()> {
        let typ = self.get(id)?.type_def();
        let node = typ.union_value(selector, value)?.get_backing();
        self.commit(id, node)
    }

    /// Push onto a list, bitlist or byte list
    pub fn append(&mut self, id: ViewId, value: View) -> Result<()> {
        let view = self.get(id)?;
        let node = match view {
            View::ByteList(v) => {
                let byte = match value {
                    View::Basic(b) => byte_of(b)?,
                    other => {
                        return Err(Error::UnsupportedOperation(format!(
                            "cannot append {:?} to a ByteList",
                            other
                        )))
                    }
                };
                v.appended(byte)?.get_backing()
            }
            View::Composite(c) => {
                let typ = c.type_def();
                let (count, mixin) = match typ.layout() {
                    Layout::Packed { count, mixin, .. }
                    | Layout::Bits { count, mixin }
                    | Layout::Elements { count, mixin, .. } => (count, mixin),
                    _ => (0, false),
                };
                if !mixin {
                    return Err(Error::UnsupportedMutation(format!("cannot append to {}", typ)));
                }
                let length = c.length()?;
                check_limit(length + 1, count)?;
                let grown = grow(c.backing(), length + 1)?;
                write_element(typ, &grown, length, value)?
            }
            other => {
                return Err(Error::UnsupportedMutation(format!(
                    "cannot append to {}",
                    other.type_def()
                )))
            }
        };
        self.commit(id, node)
    }

    /// Remove the last element of a list, bitlist or byte list and return it.
    /// The freed slot is zeroed, so the root matches a list built without it.
    pub fn pop(&mut self, id: ViewId) -> Result<View> {
        let view = self.get(id)?;
        let (node, popped) = match view {
            View::ByteList(v) => {
                let (rest, byte) = v.popped()?;
                (rest.get_backing(), View::Basic(Uint8(byte).into()))
            }
            View::Composite(c) if c.type_def().has_length_mixin() => {
                let typ = c.type_def();
                let length = c.length()?;
                if length == 0 {
                    return Err(Error::ValueOutOfRange(format!("pop from an empty {}", typ)));
                }
                let last = length - 1;
                let popped = view.navigate_view(&Key::Index(last))?;
                let cleared = clear_element(typ, c.backing(), last)?;
                (grow(&cleared, last)?, popped)
            }
            other => {
                return Err(Error::UnsupportedMutation(format!(
                    "cannot pop from {}",
                    other.type_def()
                )))
            }
        };
        self.commit(id, node)?;
        Ok(popped)
    }
}

fn byte_of(value: BasicValue) -> Result<u8> {
    match value.convert(BasicKind::Uint8)? {
        BasicValue::Uint8(b) => Ok(b.0),
        other => Err(Error::ValueOutOfRange(format!("{:?} is not a byte", other))),
    }
}

fn with_bit(chunk: Root, bit: usize, set: bool) -> [u8; BYTES_PER_CHUNK] {
    let mut bytes = *chunk.as_bytes();
    if set {
        bytes[bit / 8] |= 1 << (bit % 8);
    } else {
        bytes[bit / 8] &= !(1 << (bit % 8));
    }
    bytes
}

/// Replace the length mix-in
fn grow(backing: &Node, length: u64) -> Result<Node> {
    backing.set(Gindex::new(3)?, false, Node::leaf(Root::from_length(length)))
}

/// Write `value` as element `index` of a list whose length already covers it
fn write_element(typ: &TypeDef, backing: &Node, index: u64, value: View) -> Result<Node> {
    let gindex = typ.key_to_static_gindex(&Key::Index(index))?;
    match typ.layout() {
        Layout::Packed { kind, .. } => {
            let value = match TypeDef::Basic(kind).coerce(value)? {
                View::Basic(v) => v,
                other => {
                    return Err(Error::ValueOutOfRange(format!(
                        "{:?} is not a {}",
                        other, kind
                    )))
                }
            };
            let chunk = backing.getter(gindex)?.merkle_root();
            let offset = (index % kind.per_chunk() as u64) as usize * kind.byte_length();
            let mut bytes = *chunk.as_bytes();
            value.write_le(&mut bytes[offset..offset + kind.byte_length()]);
            backing.set(gindex, false, Node::leaf(Root::from_bytes(bytes)))
        }
        Layout::Bits { .. } => {
            let bit = matches!(
                TypeDef::boolean().coerce(value)?,
                View::Basic(BasicValue::Boolean(Boolean(true)))
            );
            let chunk = backing.getter(gindex)?.merkle_root();
            let bytes = with_bit(chunk, (index % 256) as usize, bit);
            backing.set(gindex, false, Node::leaf(Root::from_bytes(bytes)))
        }
        Layout::Elements { elem, .. } => {
            let value = elem.coerce(value)?;
            backing.set(gindex, false, value.get_backing())
        }
        _ => Err(Error::UnsupportedMutation(format!("cannot write elements of {}", typ))),
    }
}

/// Zero element `index`, leaving the length alone
fn clear_element(typ: &TypeDef, backing: &Node, index: u64) -> Result<Node> {
    let gindex = typ.key_to_static_gindex(&Key::Index(index))?;
    match typ.layout() {
        Layout::Packed { kind, .. } => {
            let chunk = backing.getter(gindex)?.merkle_root();
            let offset = (index % kind.per_chunk() as u64) as usize * kind.byte_length();
            let mut bytes = *chunk.as_bytes();
            bytes[offset..offset + kind.byte_length()].fill(0);
            backing.set(gindex, false, Node::leaf(Root::from_bytes(bytes)))
        }
        Layout::Bits { .. } => {
            let chunk = backing.getter(gindex)?.merkle_root();
            let bytes = with_bit(chunk, (index % 256) as usize, false);
            backing.set(gindex, false, Node::leaf(Root::from_bytes(bytes)))
        }
        _ => backing.set(gindex, false, zero_node(0)),
    }
}
