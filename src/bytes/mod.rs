//! Raw byte sequence views
//!
//! Both kinds keep their bytes as-is and only build a tree when a root or a
//! backing node is asked for.

mod list;
mod vector;

pub use list::ByteList;
pub use vector::ByteVector;

pub(crate) use list::{check_limit, read_length};
