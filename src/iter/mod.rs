//! Readonly iterators over the bottom of a subtree
//!
//! Every iterator here walks a perfect subtree left to right while holding
//! only one node per level. They are single pass; build a new one to start
//! over. Construction fails if the element count cannot fit the depth.

mod bits;
mod nodes;
mod packed;
mod views;

pub use bits::BitIter;
pub use nodes::NodeIter;
pub use packed::PackedIter;
pub use views::{FieldIter, RebindIter, ViewIter};
