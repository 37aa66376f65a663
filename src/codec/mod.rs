//! Interchange codec for generated instances.

mod json;


pub use json::*;
