//! Schema module defines the descriptor tree that generated types are laid
//! over.
//!
//! A schema is a tree of containers, keyed lists, leaves, leaf-lists and the
//! choice/case entries that group alternatives without appearing in data. It
//! is loaded once (usually from YAML) and shared read-only afterwards.

mod elements;
mod parser;
mod range;
mod resolve;

pub use elements::*;
pub use parser::*;
pub use range::*;
pub use resolve::*;
