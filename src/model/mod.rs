//! # Tree Model
//!
//! DTOs for the hierarchical data fetched from a geometry source and for
//! the typed values read back out of it.
//!
//! Design rule: this module is pure data. No I/O, no state, no async.

pub mod tree;
pub mod atomic;
pub mod value;

pub use tree::{Tree, TreeNode, NodeId, NodeSpec};
pub use atomic::{Atomic, AtomicData, AtomicDescriptor, ElementType};
pub use value::Value;
