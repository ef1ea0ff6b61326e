//! Type descriptors: everything that can be known about a type without an instance

use super::Key;
use crate::basic::BasicKind;
use crate::hash::Root;
use crate::tree::{depth_for, fill_to_contents, fill_to_length, zero_node, Gindex, Node};
use crate::{Error, Result, BYTES_PER_CHUNK, BYTES_PER_LENGTH_OFFSET};
use std::fmt;
use std::sync::Arc;

/// Largest number of union options
pub const MAX_UNION_OPTIONS: usize = 128;

const BITS_PER_CHUNK: u64 = 8 * BYTES_PER_CHUNK as u64;

/// An SSZ type
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TypeDef {
    Basic(BasicKind),
    ByteVector(u64),
    ByteList(u64),
    Bitvector(u64),
    Bitlist(u64),
    Vector(Arc<TypeDef>, u64),
    List(Arc<TypeDef>, u64),
    Container(Arc<ContainerDef>),
    Union(Arc<[Option<TypeDef>]>),
}

/// Named, ordered fields of a container
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContainerDef {
    pub name: String,
    pub fields: Vec<(String, TypeDef)>,
}

impl ContainerDef {
    pub fn field_index(&self, key: &Key) -> Result<usize> {
        match key {
            Key::Index(i) if (*i as usize) < self.fields.len() => Ok(*i as usize),
            Key::Field(name) => self
                .fields
                .iter()
                .position(|(n, _)| n == name)
                .ok_or_else(|| Error::navigation(format!("{} has no field {}", self.name, name))),
            _ => Err(Error::navigation(format!("{} has no field {}", self.name, key))),
        }
    }
}

/// How a type is laid out in its tree
pub(crate) enum Layout<'a> {
    /// A scalar in a single chunk
    Basic(BasicKind),
    /// Scalars packed into chunks; `count` is the length or the limit
    Packed {
        kind: BasicKind,
        count: u64,
        mixin: bool,
    },
    /// Bits packed 256 per chunk
    Bits { count: u64, mixin: bool },
    /// One subtree per element
    Elements {
        elem: &'a TypeDef,
        count: u64,
        mixin: bool,
    },
    Fields(&'a Arc<ContainerDef>),
    Union(&'a [Option<TypeDef>]),
}

pub(crate) fn packed_chunk_count(kind: BasicKind, count: u64) -> u64 {
    let bytes = u128::from(count) * kind.byte_length() as u128;
    // never more chunks than elements
    u64::try_from(bytes.div_ceil(BYTES_PER_CHUNK as u128)).unwrap_or(u64::MAX)
}

pub(crate) fn bits_chunk_count(count: u64) -> u64 {
    count.div_ceil(BITS_PER_CHUNK)
}

impl TypeDef {
    pub fn boolean() -> Self {
        TypeDef::Basic(BasicKind::Boolean)
    }

    pub fn uint8() -> Self {
        TypeDef::Basic(BasicKind::Uint8)
    }

    pub fn uint16() -> Self {
        TypeDef::Basic(BasicKind::Uint16)
    }

    pub fn uint32() -> Self {
        TypeDef::Basic(BasicKind::Uint32)
    }

    pub fn uint64() -> Self {
        TypeDef::Basic(BasicKind::Uint64)
    }

    pub fn uint128() -> Self {
        TypeDef::Basic(BasicKind::Uint128)
    }

    pub fn uint256() -> Self {
        TypeDef::Basic(BasicKind::Uint256)
    }

    pub fn byte_vector(length: u64) -> Result<Self> {
        non_empty("ByteVector", length)?;
        Ok(TypeDef::ByteVector(length))
    }

    pub fn byte_list(limit: u64) -> Self {
        TypeDef::ByteList(limit)
    }

    pub fn bitvector(length: u64) -> Result<Self> {
        non_empty("Bitvector", length)?;
        Ok(TypeDef::Bitvector(length))
    }

    pub fn bitlist(limit: u64) -> Self {
        TypeDef::Bitlist(limit)
    }

    pub fn vector(elem: TypeDef, length: u64) -> Result<Self> {
        non_empty("Vector", length)?;
        Ok(TypeDef::Vector(Arc::new(elem), length))
    }

    pub fn list(elem: TypeDef, limit: u64) -> Self {
        TypeDef::List(Arc::new(elem), limit)
    }

    pub fn container<S: Into<String>>(
        name: impl Into<String>,
        fields: Vec<(S, TypeDef)>,
    ) -> Result<Self> {
        let name = name.into();
        let fields: Vec<(String, TypeDef)> =
            fields.into_iter().map(|(n, t)| (n.into(), t)).collect();
        if fields.is_empty() {
            return Err(Error::ValueOutOfRange(format!("container {} has no fields", name)));
        }
        for (i, (field, _)) in fields.iter().enumerate() {
            if fields[..i].iter().any(|(other, _)| other == field) {
                return Err(Error::ValueOutOfRange(format!(
                    "container {} repeats field {}",
                    name, field
                )));
            }
        }
        Ok(TypeDef::Container(Arc::new(ContainerDef { name, fields })))
    }

    /// A union; only the first option may be `None`
    pub fn union(options: Vec<Option<TypeDef>>) -> Result<Self> {
        if options.is_empty() || options.len() > MAX_UNION_OPTIONS {
            return Err(Error::ValueOutOfRange(format!(
                "union needs 1 to {} options, got {}",
                MAX_UNION_OPTIONS,
                options.len()
            )));
        }
        if options.iter().skip(1).any(Option::is_none) {
            return Err(Error::ValueOutOfRange(
                "only the first union option can be None".into(),
            ));
        }
        if options.len() == 1 && options[0].is_none() {
            return Err(Error::ValueOutOfRange("union of only None".into()));
        }
        Ok(TypeDef::Union(options.into()))
    }

    pub(crate) fn layout(&self) -> Layout<'_> {
        match self {
            TypeDef::Basic(kind) => Layout::Basic(*kind),
            TypeDef::ByteVector(n) => Layout::Packed {
                kind: BasicKind::Uint8,
                count: *n,
                mixin: false,
            },
            TypeDef::ByteList(limit) => Layout::Packed {
                kind: BasicKind::Uint8,
                count: *limit,
                mixin: true,
            },
            TypeDef::Bitvector(n) => Layout::Bits {
                count: *n,
                mixin: false,
            },
            TypeDef::Bitlist(limit) => Layout::Bits {
                count: *limit,
                mixin: true,
            },
            TypeDef::Vector(elem, n) | TypeDef::List(elem, n) => {
                let mixin = matches!(self, TypeDef::List(..));
                match elem.as_ref() {
                    TypeDef::Basic(kind) => Layout::Packed {
                        kind: *kind,
                        count: *n,
                        mixin,
                    },
                    elem => Layout::Elements {
                        elem,
                        count: *n,
                        mixin,
                    },
                }
            }
            TypeDef::Container(def) => Layout::Fields(def),
            TypeDef::Union(options) => Layout::Union(options),
        }
    }

    pub fn basic_kind(&self) -> Option<BasicKind> {
        match self {
            TypeDef::Basic(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_basic(&self) -> bool {
        matches!(self, TypeDef::Basic(_))
    }

    /// Whether the root pairs the contents with a length
    pub fn has_length_mixin(&self) -> bool {
        matches!(
            self.layout(),
            Layout::Packed { mixin: true, .. }
                | Layout::Bits { mixin: true, .. }
                | Layout::Elements { mixin: true, .. }
        )
    }

    /// Length of a vector-like type, or limit of a list-like type
    pub fn element_count(&self) -> Option<u64> {
        match self.layout() {
            Layout::Packed { count, .. }
            | Layout::Bits { count, .. }
            | Layout::Elements { count, .. } => Some(count),
            _ => None,
        }
    }

    /// Depth of the subtree holding the elements (below any mix-in)
    pub fn contents_depth(&self) -> u32 {
        match self.layout() {
            Layout::Basic(_) => 0,
            Layout::Packed { kind, count, .. } => depth_for(packed_chunk_count(kind, count)),
            Layout::Bits { count, .. } => depth_for(bits_chunk_count(count)),
            Layout::Elements { count, .. } => depth_for(count),
            Layout::Fields(def) => depth_for(def.fields.len() as u64),
            Layout::Union(_) => 1,
        }
    }

    pub fn tree_depth(&self) -> u32 {
        match self.layout() {
            Layout::Union(_) => 1,
            _ => self.contents_depth() + u32::from(self.has_length_mixin()),
        }
    }

    pub fn is_fixed_byte_length(&self) -> bool {
        match self.layout() {
            Layout::Basic(_) => true,
            Layout::Packed { mixin, .. } | Layout::Bits { mixin, .. } => !mixin,
            Layout::Elements { elem, mixin, .. } => !mixin && elem.is_fixed_byte_length(),
            Layout::Fields(def) => def.fields.iter().all(|(_, t)| t.is_fixed_byte_length()),
            Layout::Union(_) => false,
        }
    }

    /// Exact encoded length; fails for variable-length types
    pub fn byte_length(&self) -> Result<usize> {
        if !self.is_fixed_byte_length() {
            return Err(Error::LengthIsDynamic(self.to_string()));
        }
        usize::try_from(self.min_byte_length())
            .map_err(|_| Error::ValueOutOfRange(format!("{} is too large to encode", self)))
    }

    /// Size of this type's slot in an enclosing fixed-size part
    pub(crate) fn fixed_part_length(&self) -> u64 {
        if self.is_fixed_byte_length() {
            self.min_byte_length()
        } else {
            BYTES_PER_LENGTH_OFFSET as u64
        }
    }

    pub fn min_byte_length(&self) -> u64 {
        match self.layout() {
            Layout::Basic(kind) => kind.byte_length() as u64,
            Layout::Packed { kind, count, mixin } => {
                if mixin {
                    0
                } else {
                    count.saturating_mul(kind.byte_length() as u64)
                }
            }
            Layout::Bits { count, mixin } => {
                if mixin {
                    1
                } else {
                    count.div_ceil(8)
                }
            }
            Layout::Elements { elem, count, mixin } => {
                if mixin {
                    0
                } else if elem.is_fixed_byte_length() {
                    count.saturating_mul(elem.min_byte_length())
                } else {
                    count.saturating_mul(
                        (BYTES_PER_LENGTH_OFFSET as u64).saturating_add(elem.min_byte_length()),
                    )
                }
            }
            Layout::Fields(def) => def
                .fields
                .iter()
                .map(|(_, t)| {
                    if t.is_fixed_byte_length() {
                        t.min_byte_length()
                    } else {
                        (BYTES_PER_LENGTH_OFFSET as u64).saturating_add(t.min_byte_length())
                    }
                })
                .fold(0u64, u64::saturating_add),
            Layout::Union(options) => {
                1 + options
                    .iter()
                    .map(|o| o.as_ref().map_or(0, TypeDef::min_byte_length))
                    .min()
                    .unwrap_or(0)
            }
        }
    }

    pub fn max_byte_length(&self) -> u64 {
        match self.layout() {
            Layout::Basic(kind) => kind.byte_length() as u64,
            Layout::Packed { kind, count, .. } => count.saturating_mul(kind.byte_length() as u64),
            Layout::Bits { count, mixin } => {
                if mixin {
                    count / 8 + 1
                } else {
                    count.div_ceil(8)
                }
            }
            Layout::Elements { elem, count, .. } => {
                if elem.is_fixed_byte_length() {
                    count.saturating_mul(elem.max_byte_length())
                } else {
                    count.saturating_mul(
                        (BYTES_PER_LENGTH_OFFSET as u64).saturating_add(elem.max_byte_length()),
                    )
                }
            }
            Layout::Fields(def) => def
                .fields
                .iter()
                .map(|(_, t)| {
                    if t.is_fixed_byte_length() {
                        t.max_byte_length()
                    } else {
                        (BYTES_PER_LENGTH_OFFSET as u64).saturating_add(t.max_byte_length())
                    }
                })
                .fold(0u64, u64::saturating_add),
            Layout::Union(options) => options
                .iter()
                .map(|o| o.as_ref().map_or(0, TypeDef::max_byte_length))
                .max()
                .unwrap_or(0)
                .saturating_add(1),
        }
    }

    /// The tree of the type's zero value
    pub fn default_node(&self) -> Node {
        let contents_depth = self.contents_depth();
        let contents = match self.layout() {
            Layout::Basic(_) => return zero_node(0),
            Layout::Packed { .. } | Layout::Bits { .. } => zero_node(contents_depth),
            Layout::Elements { mixin: true, .. } => zero_node(contents_depth),
            Layout::Elements { elem, count, .. } => {
                fill_to_length(elem.default_node(), contents_depth, count)
            }
            Layout::Fields(def) => {
                let defaults: Vec<Node> =
                    def.fields.iter().map(|(_, t)| t.default_node()).collect();
                fill_to_contents(&defaults, contents_depth)
            }
            Layout::Union(options) => {
                let value = options[0]
                    .as_ref()
                    .map_or_else(|| zero_node(0), TypeDef::default_node);
                return Node::pair(value, Node::leaf(Root::ZERO));
            }
        };
        if self.has_length_mixin() {
            Node::pair(contents, Node::leaf(Root::ZERO))
        } else {
            contents
        }
    }

    /// Type of the child at `key`
    pub fn navigate_type(&self, key: &Key) -> Result<TypeDef> {
        match (self.layout(), key) {
            (Layout::Packed { mixin: true, .. }, Key::Length)
            | (Layout::Bits { mixin: true, .. }, Key::Length)
            | (Layout::Elements { mixin: true, .. }, Key::Length) => Ok(TypeDef::uint64()),
            (Layout::Packed { kind, count, .. }, Key::Index(i)) if *i < count => {
                Ok(TypeDef::Basic(kind))
            }
            (Layout::Bits { count, .. }, Key::Index(i)) if *i < count => Ok(TypeDef::boolean()),
            (Layout::Elements { elem, count, .. }, Key::Index(i)) if *i < count => {
                Ok(elem.clone())
            }
            (Layout::Fields(def), key) => {
                let index = def.field_index(key)?;
                Ok(def.fields[index].1.clone())
            }
            (Layout::Union(options), Key::Index(i)) => match options.get(*i as usize) {
                Some(Some(t)) => Ok(t.clone()),
                _ => Err(Error::navigation(format!("{} has no option {}", self, i))),
            },
            (Layout::Union(_), Key::Selector) => Ok(TypeDef::uint8()),
            _ => Err(Error::navigation(format!("cannot navigate {} with {}", self, key))),
        }
    }

    /// Gindex of the child at `key`, relative to this type's root
    pub fn key_to_static_gindex(&self, key: &Key) -> Result<Gindex> {
        let contents_depth = self.contents_depth();
        let mixin = self.has_length_mixin();
        // chunk index inside the contents subtree
        let chunk = match (self.layout(), key) {
            (_, Key::Length) if mixin => return Gindex::new(3),
            (Layout::Packed { kind, count, .. }, Key::Index(i)) if *i < count => {
                i * kind.byte_length() as u64 / BYTES_PER_CHUNK as u64
            }
            (Layout::Bits { count, .. }, Key::Index(i)) if *i < count => i / BITS_PER_CHUNK,
            (Layout::Elements { count, .. }, Key::Index(i)) if *i < count => *i,
            (Layout::Fields(def), key) => def.field_index(key)? as u64,
            (Layout::Union(options), Key::Index(i)) => {
                return match options.get(*i as usize) {
                    Some(Some(_)) => Gindex::new(2),
                    _ => Err(Error::navigation(format!("{} has no option {}", self, i))),
                }
            }
            (Layout::Union(_), Key::Selector) => return Gindex::new(3),
            _ => {
                return Err(Error::navigation(format!(
                    "cannot navigate {} with {}",
                    self, key
                )))
            }
        };
        Gindex::from_index(chunk, contents_depth + u32::from(mixin))
    }
}

fn non_empty(kind: &str, length: u64) -> Result<()> {
    if length == 0 {
        return Err(Error::ValueOutOfRange(format!("{} of length 0", kind)));
    }
    Ok(())
}

impl fmt::Display for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDef::Basic(kind) => write!(f, "{}", kind),
            TypeDef::ByteVector(n) => write!(f, "ByteVector[{}]", n),
            TypeDef::ByteList(limit) => write!(f, "ByteList[{}]", limit),
            TypeDef::Bitvector(n) => write!(f, "Bitvector[{}]", n),
            TypeDef::Bitlist(limit) => write!(f, "Bitlist[{}]", limit),
            TypeDef::Vector(elem, n) => write!(f, "Vector[{}, {}]", elem, n),
            TypeDef::List(elem, limit) => write!(f, "List[{}, {}]", elem, limit),
            TypeDef::Container(def) => f.write_str(&def.name),
            TypeDef::Union(options) => {
                f.write_str("Union[")?;
                for (i, option) in options.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match option {
                        Some(t) => write!(f, "{}", t)?,
                        None => f.write_str("None")?,
                    }
                }
                f.write_str("]")
            }
        }
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDef({})", self)
    }
}
