//! Diff module computes the updates that transform one instance into another.

mod diff;

pub use diff::{collect_leaves, deletions, diff, Update};

pub(crate) use diff::{alt_elems, entry_path};

#[cfg(test)]
mod diff_test;
