//! Navigation keys

use std::fmt;

/// One navigation step into a composite type
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Element of a vector/list, or field of a container by position
    Index(u64),
    /// Field of a container by name
    Field(String),
    /// Length mix-in of a list-like type
    Length,
    /// Selector of a union
    Selector,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "[{}]", i),
            Key::Field(name) => write!(f, ".{}", name),
            Key::Length => f.write_str(".__len__"),
            Key::Selector => f.write_str(".__selector__"),
        }
    }
}

impl From<u64> for Key {
    fn from(i: u64) -> Self {
        Key::Index(i)
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i as u64)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Field(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Field(name)
    }
}
