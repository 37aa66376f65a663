//! Concurrent tree index: values stored by structured path, with a lock on
//! every node so that writers to disjoint subtrees do not contend.

mod tree;

pub use tree::*;
