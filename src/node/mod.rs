//! Node module defines the contract between the engine and generated types.

mod macros;
mod node;

pub use node::*;
