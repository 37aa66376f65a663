//! Generic node navigation over generated types.
//!
//! Every operation walks a generated instance (or, for [`new_node`], only its
//! type) alongside the schema descriptor tree, consuming one or more path
//! elements per level as given by each field's path annotation.

mod get;
mod options;
mod set;

pub use get::{get_node, new_node, NodeData, TreeNode};
pub use options::NodeOption;
pub use set::{delete_node, set_node, NodeValue};

pub(crate) use get::{retrieve_node, RetrieveArgs};
