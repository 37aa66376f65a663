//! Engine error type and the legacy status taxonomy.

use crate::value::ValueError;
use thiserror::Error;

/// Code is the status taxonomy reported by the legacy Get/New entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    Ok,
    InvalidArgument,
    NotFound,
    Internal,
}

/// NodeError is returned by the navigator, differ, merger and codec.
///
/// Every message carries enough context (type name, schema entry, remaining
/// path) to diagnose a failure without re-running with tracing enabled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// Generated type and schema disagree: a field without path metadata or a
    /// path that does not exist in the schema tree.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// The path does not address any schema or data node.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Malformed input: missing key map, wrong value shape, mismatched types.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl NodeError {
    /// Creates a new SchemaMismatch error.
    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        NodeError::SchemaMismatch {
            message: message.into(),
        }
    }

    /// Creates a new NotFound error.
    pub fn not_found(message: impl Into<String>) -> Self {
        NodeError::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new InvalidArgument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        NodeError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a new Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        NodeError::Internal {
            message: message.into(),
        }
    }

    /// Maps the error onto the legacy status taxonomy.
    pub fn code(&self) -> Code {
        match self {
            NodeError::SchemaMismatch { .. } | NodeError::Internal { .. } => Code::Internal,
            NodeError::NotFound { .. } => Code::NotFound,
            NodeError::InvalidArgument { .. } => Code::InvalidArgument,
        }
    }

    /// Reports whether the error is NotFound.
    pub fn is_not_found(&self) -> bool {
        matches!(self, NodeError::NotFound { .. })
    }

    /// Returns the error message without its kind prefix.
    pub fn message(&self) -> &str {
        match self {
            NodeError::SchemaMismatch { message }
            | NodeError::NotFound { message }
            | NodeError::InvalidArgument { message }
            | NodeError::Internal { message } => message,
        }
    }
}

impl From<ValueError> for NodeError {
    fn from(err: ValueError) -> Self {
        NodeError::invalid_argument(err.to_string())
    }
}
