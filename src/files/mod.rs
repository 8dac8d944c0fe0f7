//! The virtual file tree.
//!
//! A pure in-memory namespace of files, directories and links. No I/O
//! happens here; regular entries only remember where their bytes will be
//! read from when the tree is serialized.

mod entry;
mod tree;

pub use entry::{Entry, TreeError};
pub use tree::Tree;
