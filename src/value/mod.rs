//! Value module - Typed scalar values and the conversions generated leaves
//! use to move in and out of the engine.

mod value;

pub use value::*;
