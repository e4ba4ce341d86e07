//! Flat file map → nested mount tree.
//!
//! The sandbox filesystem takes a nested directory/file structure. Every
//! path in the source map becomes exactly one file leaf; intermediate
//! directories are created on the way. A path that would need the same
//! segment to be both a file and a directory is rejected rather than
//! resolved by insertion order.

mod tree;

pub use tree::{to_mount_tree, MountError, MountNode, MountTree};
