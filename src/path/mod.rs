//! Path module - Structured paths addressing nodes in a data tree.

mod parse;
mod path;

pub use parse::*;
pub use path::*;
