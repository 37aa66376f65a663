//! Validation of generated instances against their schema: scalar
//! constraints, list key consistency and leafref referential integrity.

mod leafref;
mod validation;
mod validator;


pub use validation::*;
pub use validator::{check_scalar, validate};
