//! Views: typed instances over a backing tree

use super::{codec, Encodable, Key, Layout, Navigable, TreeBacked, TypeDef};
use crate::basic::{BasicKind, BasicValue, Boolean, Uint64, Uint8};
use crate::bytes::{check_limit, read_length, ByteList, ByteVector};
use crate::hash::Root;
use crate::iter::{BitIter, FieldIter, NodeIter, PackedIter, RebindIter, ViewIter};
use crate::tree::{subtree_fill_to_contents, zero_node, Gindex, Node};
use crate::view::pack::{bits_to_bytes, pack_bytes_to_chunks};
use crate::{Error, Result};
use bytes::Buf;
use serde_json::{Map, Value as Json};
use std::fmt;

/// An instance of a [`TypeDef`]
#[derive(Clone)]
pub enum View {
    /// Scalars are plain values
    Basic(BasicValue),
    ByteVector(ByteVector),
    ByteList(ByteList),
    /// Vectors, lists, bitfields, containers and unions
    Composite(CompositeView),
}

/// A composite type bound to its backing tree
#[derive(Clone)]
pub struct CompositeView {
    typ: TypeDef,
    backing: Node,
}

impl CompositeView {
    pub(crate) fn new(typ: TypeDef, backing: Node) -> Self {
        CompositeView { typ, backing }
    }

    pub fn type_def(&self) -> &TypeDef {
        &self.typ
    }

    pub fn backing(&self) -> &Node {
        &self.backing
    }

    /// Element count: the stored length of a list, the fixed length of a
    /// vector, the field count of a container
    pub fn length(&self) -> Result<u64> {
        match self.typ.layout() {
            Layout::Packed { mixin: true, .. }
            | Layout::Bits { mixin: true, .. }
            | Layout::Elements { mixin: true, .. } => {
                read_length(&self.backing.get_right()?.merkle_root())
            }
            Layout::Packed { count, .. }
            | Layout::Bits { count, .. }
            | Layout::Elements { count, .. } => Ok(count),
            Layout::Fields(def) => Ok(def.fields.len() as u64),
            Layout::Basic(_) | Layout::Union(_) => Err(Error::UnsupportedOperation(format!(
                "{} has no length",
                self.typ
            ))),
        }
    }

    /// Active option of a union
    pub fn selector(&self) -> Result<u8> {
        let Layout::Union(options) = self.typ.layout() else {
            return Err(Error::UnsupportedOperation(format!("{} is not a union", self.typ)));
        };
        let chunk = self.backing.get_right()?.merkle_root();
        let raw = read_length(&chunk)?;
        match u8::try_from(raw) {
            Ok(selector) if (selector as usize) < options.len() => Ok(selector),
            _ => Err(Error::ValueOutOfRange(format!(
                "selector {} out of {} options",
                raw,
                options.len()
            ))),
        }
    }

    /// The subtree holding the elements, below any length mix-in
    pub(crate) fn contents(&self) -> Result<Node> {
        if self.typ.has_length_mixin() {
            Ok(self.backing.get_left()?.clone())
        } else {
            Ok(self.backing.clone())
        }
    }

    /// Shape of the backing: a pair under a mix-in, a stored length within
    /// the limit, a selector naming an option
    fn check_backing(&self) -> Result<()> {
        let needs_pair = self.typ.has_length_mixin() || matches!(self.typ, TypeDef::Union(_));
        if needs_pair && self.backing.is_leaf() {
            return Err(Error::navigation(format!(
                "{} must be backed by a pair",
                self.typ
            )));
        }
        match self.typ.layout() {
            Layout::Packed { count, mixin: true, .. }
            | Layout::Bits { count, mixin: true }
            | Layout::Elements { count, mixin: true, .. } => check_limit(self.length()?, count),
            Layout::Union(_) => self.selector().map(|_| ()),
            _ => Ok(()),
        }
    }

    fn check_index(&self, index: u64) -> Result<()> {
        let length = self.length()?;
        if index >= length {
            return Err(Error::navigation(format!(
                "index {} out of {} of length {}",
                index, self.typ, length
            )));
        }
        Ok(())
    }
}

impl Navigable for CompositeView {
    fn navigate_view(&self, key: &Key) -> Result<View> {
        let gindex = self.key_to_dynamic_gindex(key)?;
        match (self.typ.layout(), key) {
            (_, Key::Length) => Ok(View::Basic(Uint64(self.length()?).into())),
            (Layout::Union(_), Key::Selector) => Ok(View::Basic(Uint8(self.selector()?).into())),
            (Layout::Packed { kind, .. }, Key::Index(i)) => {
                let chunk = self.backing.getter(gindex)?.merkle_root();
                let slot = (i % kind.per_chunk() as u64) as usize;
                Ok(View::Basic(BasicValue::from_chunk(kind, &chunk, slot)?))
            }
            (Layout::Bits { .. }, Key::Index(i)) => {
                let chunk = self.backing.getter(gindex)?.merkle_root();
                let bit = (i % 256) as usize;
                let set = (chunk.as_bytes()[bit / 8] >> (bit % 8)) & 1 == 1;
                Ok(View::Basic(Boolean(set).into()))
            }
            _ => {
                let child = self.typ.navigate_type(key)?;
                child.view_from_backing(self.backing.getter(gindex)?)
            }
        }
    }

    fn key_to_dynamic_gindex(&self, key: &Key) -> Result<Gindex> {
        match (self.typ.layout(), key) {
            (Layout::Union(_), Key::Index(i)) => {
                let selector = self.selector()?;
                if u64::from(selector) != *i {
                    return Err(Error::navigation(format!(
                        "union holds option {}, not {}",
                        selector, i
                    )));
                }
            }
            (Layout::Packed { mixin: true, .. }, Key::Index(i))
            | (Layout::Bits { mixin: true, .. }, Key::Index(i))
            | (Layout::Elements { mixin: true, .. }, Key::Index(i)) => self.check_index(*i)?,
            _ => {}
        }
        self.typ.key_to_static_gindex(key)
    }
}

impl View {
    pub fn type_def(&self) -> TypeDef {
        match self {
            View::Basic(v) => TypeDef::Basic(v.kind()),
            View::ByteVector(v) => v.type_def(),
            View::ByteList(v) => v.type_def(),
            View::Composite(c) => c.typ.clone(),
        }
    }

    pub fn as_basic(&self) -> Option<BasicValue> {
        match self {
            View::Basic(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeView> {
        match self {
            View::Composite(c) => Some(c),
            _ => None,
        }
    }

    /// Raw contents of a byte vector or byte list
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            View::ByteVector(v) => Some(v.as_bytes()),
            View::ByteList(v) => Some(v.as_bytes()),
            _ => None,
        }
    }

    pub fn length(&self) -> Result<u64> {
        match self {
            View::Basic(v) => Err(Error::UnsupportedOperation(format!(
                "{} has no length",
                v.kind()
            ))),
            View::ByteVector(v) => Ok(v.len() as u64),
            View::ByteList(v) => Ok(v.len() as u64),
            View::Composite(c) => c.length(),
        }
    }

    /// Shorthand for [`Navigable::navigate_view`]
    pub fn get(&self, key: impl Into<Key>) -> Result<View> {
        self.navigate_view(&key.into())
    }

    /// Point the view at another tree of the same type
    pub(crate) fn rebind(&mut self, node: Node) -> Result<()> {
        match self {
            View::Composite(c) => {
                let previous = std::mem::replace(&mut c.backing, node);
                if let Err(err) = c.check_backing() {
                    c.backing = previous;
                    return Err(err);
                }
                Ok(())
            }
            other => {
                *other = other.type_def().view_from_backing(node)?;
                Ok(())
            }
        }
    }

    /// Contents subtree, its depth and the element count
    fn walk_parts(&self) -> Result<(Node, u32, u64)> {
        let typ = self.type_def();
        let contents = match self {
            View::Composite(c) => c.contents()?,
            other if typ.has_length_mixin() => other.get_backing().get_left()?.clone(),
            other => other.get_backing(),
        };
        Ok((contents, typ.contents_depth(), self.length()?))
    }

    /// Elements of a sequence of scalars, byte sequences included
    pub fn basic_values(&self) -> Result<PackedIter> {
        match self.type_def().layout() {
            Layout::Packed { kind, .. } => {
                let (contents, depth, length) = self.walk_parts()?;
                PackedIter::new(contents, depth, kind, length)
            }
            _ => Err(Error::UnsupportedOperation(format!(
                "{} is not a sequence of scalars",
                self.type_def()
            ))),
        }
    }

    pub fn bits(&self) -> Result<BitIter> {
        match self.type_def().layout() {
            Layout::Bits { .. } => {
                let (contents, depth, length) = self.walk_parts()?;
                BitIter::new(contents, depth, length)
            }
            _ => Err(Error::UnsupportedOperation(format!(
                "{} is not a bitfield",
                self.type_def()
            ))),
        }
    }

    /// Bottom nodes of the contents: chunks for packed sequences, element
    /// roots otherwise
    pub fn chunks(&self) -> Result<NodeIter> {
        let typ = self.type_def();
        let count = match typ.layout() {
            Layout::Packed { kind, .. } => super::packed_chunk_count(kind, self.length()?),
            Layout::Bits { .. } => super::bits_chunk_count(self.length()?),
            Layout::Elements { .. } | Layout::Fields(_) => self.length()?,
            _ => {
                return Err(Error::UnsupportedOperation(format!("{} has no chunks", typ)));
            }
        };
        let (contents, depth, _) = self.walk_parts()?;
        NodeIter::new(contents, depth, count)
    }

    /// A fresh view per element
    pub fn element_views(&self) -> Result<ViewIter> {
        let typ = self.type_def();
        match typ.layout() {
            Layout::Elements { elem, .. } => {
                let (contents, depth, length) = self.walk_parts()?;
                ViewIter::new(contents, depth, elem.clone(), length)
            }
            _ => Err(Error::UnsupportedOperation(format!(
                "{} has no composite elements",
                typ
            ))),
        }
    }

    /// One view, re-pointed at each element in turn
    pub fn rebind_elements(&self) -> Result<RebindIter> {
        let typ = self.type_def();
        match typ.layout() {
            Layout::Elements { elem, .. } => {
                let (contents, depth, length) = self.walk_parts()?;
                RebindIter::new(contents, depth, elem.clone(), length)
            }
            _ => Err(Error::UnsupportedOperation(format!(
                "{} has no composite elements",
                typ
            ))),
        }
    }

    pub fn field_views(&self) -> Result<FieldIter> {
        match self {
            View::Composite(c) => match &c.typ {
                TypeDef::Container(def) => Ok(FieldIter::new(c.backing.clone(), def.clone())?),
                other => Err(Error::UnsupportedOperation(format!("{} has no fields", other))),
            },
            other => Err(Error::UnsupportedOperation(format!(
                "{} has no fields",
                other.type_def()
            ))),
        }
    }

    /// JSON form: uints up to 64 bits as numbers, wider uints, byte
    /// sequences and bitfields as `0x` hex, containers as objects
    pub fn to_json(&self) -> Result<Json> {
        match self {
            View::Basic(v) => v.to_json(),
            View::ByteVector(v) => Ok(Json::String(v.to_hex())),
            View::ByteList(v) => Ok(Json::String(v.to_hex())),
            View::Composite(c) => match c.typ.layout() {
                Layout::Packed { .. } => self
                    .basic_values()?
                    .map(|v| v.and_then(|v| v.to_json()))
                    .collect::<Result<Vec<_>>>()
                    .map(Json::Array),
                Layout::Bits { .. } => Ok(Json::String(format!(
                    "0x{}",
                    hex::encode(self.encode_bytes()?)
                ))),
                Layout::Elements { .. } => self
                    .element_views()?
                    .map(|v| v.and_then(|v| v.to_json()))
                    .collect::<Result<Vec<_>>>()
                    .map(Json::Array),
                Layout::Fields(def) => {
                    let mut object = Map::new();
                    for ((name, _), field) in def.fields.iter().zip(self.field_views()?) {
                        object.insert(name.clone(), field?.to_json()?);
                    }
                    Ok(Json::Object(object))
                }
                Layout::Union(options) => {
                    let selector = c.selector()?;
                    let value = match &options[selector as usize] {
                        Some(t) => t
                            .view_from_backing(c.backing.get_left()?.clone())?
                            .to_json()?,
                        None => Json::Null,
                    };
                    Ok(serde_json::json!({ "selector": selector, "value": value }))
                }
                Layout::Basic(_) => Err(Error::UnsupportedOperation(
                    "scalar stored as a composite".into(),
                )),
            },
        }
    }
}

impl Navigable for View {
    fn navigate_view(&self, key: &Key) -> Result<View> {
        match (self, key) {
            (View::Composite(c), key) => c.navigate_view(key),
            (View::ByteVector(v), Key::Index(i)) => Ok(View::Basic(Uint8(v.get(*i)?).into())),
            (View::ByteList(v), Key::Index(i)) => Ok(View::Basic(Uint8(v.get(*i)?).into())),
            (View::ByteList(v), Key::Length) => Ok(View::Basic(Uint64(v.len() as u64).into())),
            (other, key) => Err(Error::navigation(format!(
                "cannot navigate {} with {}",
                other.type_def(),
                key
            ))),
        }
    }

    fn key_to_dynamic_gindex(&self, key: &Key) -> Result<Gindex> {
        match (self, key) {
            (View::Composite(c), key) => c.key_to_dynamic_gindex(key),
            (View::ByteVector(v), Key::Index(i)) => {
                v.get(*i)?;
                v.type_def().key_to_static_gindex(key)
            }
            (View::ByteList(v), Key::Index(i)) => {
                v.get(*i)?;
                v.type_def().key_to_static_gindex(key)
            }
            (other, key) => other.type_def().key_to_static_gindex(key),
        }
    }
}

impl TreeBacked for View {
    fn get_backing(&self) -> Node {
        match self {
            View::Basic(v) => v.get_backing(),
            View::ByteVector(v) => v.get_backing(),
            View::ByteList(v) => v.get_backing(),
            View::Composite(c) => c.backing.clone(),
        }
    }

    fn set_backing(&mut self, node: Node) -> Result<()> {
        match self {
            View::Composite(c) => {
                let previous = std::mem::replace(&mut c.backing, node);
                if let Err(err) = c.check_backing() {
                    c.backing = previous;
                    return Err(err);
                }
                Ok(())
            }
            other => Err(Error::UnsupportedMutation(format!(
                "{} derives its tree from its value",
                other.type_def()
            ))),
        }
    }
}

impl Encodable for View {
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            View::Basic(v) => v.encode_into(out),
            View::ByteVector(v) => v.encode_into(out),
            View::ByteList(v) => v.encode_into(out),
            View::Composite(c) => codec::encode_composite(c, out),
        }
    }
}

/// Views are equal when their roots are
impl PartialEq for View {
    fn eq(&self, other: &Self) -> bool {
        self.hash_tree_root() == other.hash_tree_root()
    }
}

impl Eq for View {}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Basic(v) => fmt::Debug::fmt(v, f),
            View::ByteVector(v) => fmt::Debug::fmt(v, f),
            View::ByteList(v) => fmt::Debug::fmt(v, f),
            View::Composite(c) => write!(f, "{}({})", c.typ, c.backing.merkle_root().short()),
        }
    }
}

impl From<BasicValue> for View {
    fn from(value: BasicValue) -> Self {
        View::Basic(value)
    }
}

impl From<ByteVector> for View {
    fn from(value: ByteVector) -> Self {
        View::ByteVector(value)
    }
}

impl From<ByteList> for View {
    fn from(value: ByteList) -> Self {
        View::ByteList(value)
    }
}

/// Build a composite view from its bottom nodes
pub(crate) fn assemble(typ: &TypeDef, contents: &[Node], length: u64) -> Result<View> {
    let contents = subtree_fill_to_contents(contents, typ.contents_depth())?;
    let backing = if typ.has_length_mixin() {
        Node::pair(contents, Node::leaf(Root::from_length(length)))
    } else {
        contents
    };
    Ok(View::Composite(CompositeView::new(typ.clone(), backing)))
}

fn check_count(typ: &TypeDef, count: u64, mixin: bool, given: u64) -> Result<()> {
    if mixin {
        check_limit(given, count)
    } else if given != count {
        Err(Error::ValueOutOfRange(format!(
            "{} needs {} elements, got {}",
            typ, count, given
        )))
    } else {
        Ok(())
    }
}

impl TypeDef {
    /// The zero value
    pub fn default_view(&self) -> View {
        match self {
            TypeDef::Basic(kind) => View::Basic(BasicValue::default_of(*kind)),
            TypeDef::ByteVector(n) => View::ByteVector(ByteVector::from_bytes_unchecked(
                vec![0u8; *n as usize].into(),
            )),
            TypeDef::ByteList(limit) => View::ByteList(ByteList::empty(*limit)),
            _ => View::Composite(CompositeView::new(self.clone(), self.default_node())),
        }
    }

    /// Wrap an existing tree. Composite views are bound without walking the
    /// tree, so shape errors surface on first access.
    pub fn view_from_backing(&self, node: Node) -> Result<View> {
        match self {
            TypeDef::Basic(kind) => {
                if !node.is_leaf() {
                    return Err(Error::navigation(format!("{} must be backed by a leaf", kind)));
                }
                Ok(View::Basic(BasicValue::from_chunk(*kind, &node.merkle_root(), 0)?))
            }
            TypeDef::ByteVector(n) => Ok(View::ByteVector(ByteVector::from_backing(node, *n)?)),
            TypeDef::ByteList(limit) => Ok(View::ByteList(ByteList::from_backing(node, *limit)?)),
            _ => {
                let view = CompositeView::new(self.clone(), node);
                view.check_backing()?;
                Ok(View::Composite(view))
            }
        }
    }

    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<View> {
        codec::decode(self, bytes)
    }

    /// Decode exactly `scope` bytes from a stream
    pub fn deserialize<B: Buf>(&self, stream: &mut B, scope: usize) -> Result<View> {
        if stream.remaining() < scope {
            return Err(Error::decode(format!(
                "scope of {} bytes but only {} remain",
                scope,
                stream.remaining()
            )));
        }
        if self.is_fixed_byte_length() {
            let expected = self.byte_length()?;
            if scope != expected {
                return Err(Error::decode(format!(
                    "{} is {} bytes, scope is {}",
                    self, expected, scope
                )));
            }
        }
        let bytes = stream.copy_to_bytes(scope);
        self.decode_bytes(&bytes)
    }

    /// Normalize a compatible value into a view of this type
    pub fn coerce(&self, value: View) -> Result<View> {
        match (self, value) {
            (TypeDef::Basic(kind), View::Basic(v)) => Ok(View::Basic(v.convert(*kind)?)),
            (TypeDef::ByteVector(n), value) if value.as_bytes().is_some() => {
                let bytes = value.as_bytes().unwrap_or_default();
                if bytes.len() as u64 != *n {
                    return Err(Error::ValueOutOfRange(format!(
                        "{} bytes do not fit {}",
                        bytes.len(),
                        self
                    )));
                }
                Ok(View::ByteVector(ByteVector::new(bytes.to_vec())?))
            }
            (TypeDef::ByteList(limit), value) if value.as_bytes().is_some() => {
                let bytes = value.as_bytes().unwrap_or_default();
                Ok(View::ByteList(ByteList::new(bytes.to_vec(), *limit)?))
            }
            (typ, value) if value.type_def() == *typ => Ok(value),
            (typ, value) => Err(Error::UnsupportedOperation(format!(
                "cannot coerce {} into {}",
                value.type_def(),
                typ
            ))),
        }
    }

    /// Build a sequence, bitfield or container from its elements in order.
    /// Each element is coerced into the element (or field) type.
    pub fn from_elements(&self, elements: Vec<View>) -> Result<View> {
        let given = elements.len() as u64;
        match self.layout() {
            Layout::Packed { kind, count, mixin } => {
                check_count(self, count, mixin, given)?;
                let mut bytes = Vec::with_capacity(elements.len() * kind.byte_length());
                for element in elements {
                    TypeDef::Basic(kind).coerce(element)?.encode_into(&mut bytes)?;
                }
                match self {
                    TypeDef::ByteVector(_) => Ok(View::ByteVector(ByteVector::new(bytes)?)),
                    TypeDef::ByteList(limit) => Ok(View::ByteList(ByteList::new(bytes, *limit)?)),
                    _ => assemble(self, &pack_bytes_to_chunks(&bytes), given),
                }
            }
            Layout::Bits { count, mixin } => {
                check_count(self, count, mixin, given)?;
                let bits = elements
                    .into_iter()
                    .map(|e| match TypeDef::boolean().coerce(e)? {
                        View::Basic(BasicValue::Boolean(b)) => Ok(b.0),
                        other => Err(Error::ValueOutOfRange(format!("{:?} is not a bit", other))),
                    })
                    .collect::<Result<Vec<bool>>>()?;
                assemble(self, &pack_bytes_to_chunks(&bits_to_bytes(&bits)), given)
            }
            Layout::Elements { elem, count, mixin } => {
                check_count(self, count, mixin, given)?;
                let nodes = elements
                    .into_iter()
                    .map(|e| elem.coerce(e).map(|v| v.get_backing()))
                    .collect::<Result<Vec<Node>>>()?;
                assemble(self, &nodes, given)
            }
            Layout::Fields(def) => {
                check_count(self, def.fields.len() as u64, false, given)?;
                let nodes = def
                    .fields
                    .iter()
                    .zip(elements)
                    .map(|((_, t), e)| t.coerce(e).map(|v| v.get_backing()))
                    .collect::<Result<Vec<Node>>>()?;
                assemble(self, &nodes, given)
            }
            Layout::Basic(_) | Layout::Union(_) => Err(Error::UnsupportedOperation(format!(
                "{} is not built from elements",
                self
            ))),
        }
    }

    /// A union value; `None` only for an empty first option
    pub fn union_value(&self, selector: u8, value: Option<View>) -> Result<View> {
        let TypeDef::Union(options) = self else {
            return Err(Error::UnsupportedOperation(format!("{} is not a union", self)));
        };
        let node = match (options.get(selector as usize), value) {
            (Some(None), None) => zero_node(0),
            (Some(Some(t)), Some(v)) => t.coerce(v)?.get_backing(),
            (Some(_), _) => {
                return Err(Error::ValueOutOfRange(format!(
                    "value does not match option {} of {}",
                    selector, self
                )))
            }
            (None, _) => {
                return Err(Error::ValueOutOfRange(format!(
                    "{} has no option {}",
                    self, selector
                )))
            }
        };
        let backing = Node::pair(node, Node::leaf(Root::from_length(u64::from(selector))));
        Ok(View::Composite(CompositeView::new(self.clone(), backing)))
    }

    /// Inverse of [`View::to_json`]
    pub fn from_json(&self, value: Json) -> Result<View> {
        match self {
            TypeDef::Basic(kind) => Ok(View::Basic(BasicValue::from_json(*kind, value)?)),
            TypeDef::ByteVector(_) | TypeDef::Bitvector(_) | TypeDef::Bitlist(_) => {
                let bytes = hex_field(&value)?;
                match self {
                    TypeDef::ByteVector(n) => {
                        Ok(View::ByteVector(ByteVector::decode(&bytes, *n)?))
                    }
                    _ => self.decode_bytes(&bytes),
                }
            }
            TypeDef::ByteList(limit) => {
                Ok(View::ByteList(ByteList::decode(&hex_field(&value)?, *limit)?))
            }
            TypeDef::Vector(elem, _) | TypeDef::List(elem, _) => {
                let Json::Array(items) = value else {
                    return Err(Error::decode(format!("{} expects a JSON array", self)));
                };
                let elements = items
                    .into_iter()
                    .map(|item| elem.from_json(item))
                    .collect::<Result<Vec<View>>>()?;
                self.from_elements(elements)
            }
            TypeDef::Container(def) => {
                let Json::Object(mut object) = value else {
                    return Err(Error::decode(format!("{} expects a JSON object", self)));
                };
                let elements = def
                    .fields
                    .iter()
                    .map(|(name, t)| {
                        let field = object.remove(name).ok_or_else(|| {
                            Error::decode(format!("{} is missing field {}", def.name, name))
                        })?;
                        t.from_json(field)
                    })
                    .collect::<Result<Vec<View>>>()?;
                self.from_elements(elements)
            }
            TypeDef::Union(options) => {
                let selector = value
                    .get("selector")
                    .and_then(Json::as_u64)
                    .and_then(|s| u8::try_from(s).ok())
                    .ok_or_else(|| Error::decode("union JSON needs a selector"))?;
                let inner = value.get("value").cloned().unwrap_or(Json::Null);
                let view = match options.get(selector as usize) {
                    Some(Some(t)) => Some(t.from_json(inner)?),
                    _ => None,
                };
                self.union_value(selector, view)
            }
        }
    }
}

fn hex_field(value: &Json) -> Result<Vec<u8>> {
    let s = value
        .as_str()
        .ok_or_else(|| Error::decode("expected a 0x hex string"))?;
    Ok(hex::decode(s.strip_prefix("0x").unwrap_or(s))?)
}

impl BasicKind {
    /// Type of a scalar kind
    pub fn type_def(self) -> TypeDef {
        TypeDef::Basic(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Uint16, Uint32};
    use crate::tree::zero_root;

    fn u64v(v: u64) -> View {
        View::Basic(Uint64(v).into())
    }

    fn pair_type() -> TypeDef {
        TypeDef::container(
            "Pair",
            vec![("a", TypeDef::uint64()), ("b", TypeDef::list(TypeDef::uint16(), 8))],
        )
        .unwrap()
    }

    #[test]
    fn test_default_views() {
        let list = TypeDef::list(TypeDef::uint64(), 10).default_view();
        assert_eq!(list.length().unwrap(), 0);
        assert!(matches!(list.get(0u64), Err(Error::Navigation(_))));
        let vector = TypeDef::vector(TypeDef::uint64(), 4).unwrap().default_view();
        assert_eq!(vector.get(3u64).unwrap(), u64v(0));
        assert_eq!(vector.hash_tree_root(), zero_root(0));
    }

    #[test]
    fn test_list_length_mixin() {
        let typ = TypeDef::list(TypeDef::uint8(), 10);
        let three: Vec<View> = (1..=3u8).map(|i| View::Basic(Uint8(i).into())).collect();
        let list = typ.from_elements(three).unwrap();
        let backing = list.get_backing();
        let (contents, length) = backing.children().unwrap();
        assert_eq!(length.merkle_root(), Root::from_length(3));
        assert_eq!(&contents.merkle_root().as_bytes()[..4], &[1, 2, 3, 0]);

        let four: Vec<View> = [1u8, 2, 3, 0]
            .iter()
            .map(|i| View::Basic(Uint8(*i).into()))
            .collect();
        let longer = typ.from_elements(four).unwrap();
        assert_ne!(longer.hash_tree_root(), list.hash_tree_root());
    }

    #[test]
    fn test_navigate_container() {
        let typ = pair_type();
        let b = TypeDef::list(TypeDef::uint16(), 8)
            .from_elements(vec![View::Basic(Uint16(7).into()), View::Basic(Uint16(9).into())])
            .unwrap();
        let pair = typ.from_elements(vec![u64v(5), b]).unwrap();
        assert_eq!(pair.get("a").unwrap(), u64v(5));
        let b = pair.get("b").unwrap();
        assert_eq!(b.length().unwrap(), 2);
        assert_eq!(b.get(1u64).unwrap(), View::Basic(Uint16(9).into()));
        assert!(b.get(2u64).is_err());
        assert_eq!(b.get(Key::Length).unwrap(), u64v(2));
        assert!(pair.get("c").is_err());
    }

    #[test]
    fn test_coerce() {
        let t = TypeDef::uint16();
        assert_eq!(t.coerce(u64v(9)).unwrap(), View::Basic(Uint16(9).into()));
        assert!(t.coerce(u64v(70_000)).is_err());
        let bv = TypeDef::ByteVector(2);
        assert!(bv
            .coerce(View::ByteList(ByteList::new(vec![1u8, 2], 4).unwrap()))
            .is_ok());
        assert!(bv.coerce(u64v(1)).is_err());
    }

    #[test]
    fn test_union() {
        let typ = TypeDef::union(vec![None, Some(TypeDef::uint32())]).unwrap();
        let empty = typ.default_view();
        assert_eq!(empty.get(Key::Selector).unwrap(), View::Basic(Uint8(0).into()));
        let one = typ
            .union_value(1, Some(View::Basic(Uint32(3).into())))
            .unwrap();
        assert_eq!(one.get(1u64).unwrap(), View::Basic(Uint32(3).into()));
        assert!(empty.get(1u64).is_err());
        assert!(typ.union_value(1, None).is_err());
        assert!(typ.union_value(2, None).is_err());
    }

    #[test]
    fn test_set_backing() {
        let mut list = TypeDef::list(TypeDef::uint64(), 4).default_view();
        let other = TypeDef::list(TypeDef::uint64(), 4)
            .from_elements(vec![u64v(1)])
            .unwrap();
        list.set_backing(other.get_backing()).unwrap();
        assert_eq!(list, other);
        let mut scalar = u64v(1);
        assert!(matches!(
            scalar.set_backing(zero_node(0)),
            Err(Error::UnsupportedMutation(_))
        ));
    }

    #[test]
    fn test_deserialize_scope() {
        let typ = TypeDef::uint32();
        let data = [1u8, 0, 0, 0, 9];
        let mut stream = &data[..];
        assert!(matches!(typ.deserialize(&mut stream, 5), Err(Error::Decode(_))));
        let mut stream = &data[..];
        assert_eq!(
            typ.deserialize(&mut stream, 4).unwrap(),
            View::Basic(Uint32(1).into())
        );
        assert_eq!(stream, &[9]);
        let mut short = &data[..2];
        assert!(typ.deserialize(&mut short, 4).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let typ = pair_type();
        let json = serde_json::json!({ "a": 5, "b": [1, 2, 3] });
        let view = typ.from_json(json.clone()).unwrap();
        assert_eq!(view.to_json().unwrap(), json);
        assert!(typ.from_json(serde_json::json!({ "a": 5 })).is_err());
    }
}
