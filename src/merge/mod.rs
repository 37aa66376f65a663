//! Merge module combines two instances of the same generated type.

mod conflict;
mod merge;


pub use conflict::*;
pub use merge::*;
