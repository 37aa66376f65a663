//! # YANG Tree
//!
//! A generic engine for schema-typed data trees generated from a YANG-like
//! modeling language.
//!
//! Generated types describe their fields through a static descriptor table
//! ([`node::NodeType`]); a parallel schema descriptor tree ([`schema::Schema`])
//! carries types, keys and cross references. The engine works over any
//! generated type using only those two inputs.
//!
//! ## Modules
//!
//! - [`value`] - Typed scalar values and conversions to generated leaf types
//! - [`path`] - Structured paths and their textual form
//! - [`schema`] - Schema descriptor tree, path metadata and leafref resolution
//! - [`node`] - Capability traits implemented by generated types
//! - [`ytypes`] - Get, set, create and delete nodes by path
//! - [`diff`] - Leaf-level differences between two instances
//! - [`merge`] - Merging two instances under configurable policies
//! - [`validate`] - Constraint and referential-integrity validation
//! - [`ctree`] - Concurrent path-keyed tree index
//! - [`codec`] - RFC 7951 JSON encoding
//! - [`trace`] - Explicit trace context for recursive walks
//! - [`error`] - Engine error type and status taxonomy

pub mod codec;
pub mod ctree;
pub mod diff;
pub mod error;
pub mod merge;
pub mod node;
pub mod path;
pub mod schema;
pub mod trace;
pub mod validate;
pub mod value;
pub mod ytypes;

#[cfg(test)]
mod testdata;

pub use ctree::{IndexError, IndexValue, TreeIndex};
pub use diff::{deletions, diff, Update};
pub use error::{Code, NodeError};
pub use merge::{merge, merge_into, merge_typed, Conflict, Conflicts, MergeError, MergeOption};
pub use node::{GeneratedNode, NodeType, SchemaNode};
pub use path::{Path, PathElem};
pub use schema::{EntryRef, Schema};
pub use validate::{validate, ValidationError, ValidationErrors, ValidationOption};
pub use value::{ListKey, Value};
pub use ytypes::{delete_node, get_node, new_node, set_node, NodeOption, NodeValue, TreeNode};
