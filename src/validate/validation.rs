//! Validation options and errors.

use std::fmt;
use thiserror::Error;

/// ValidationOption controls validation behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOption {
    /// Skips leafref referential-integrity checks.
    IgnoreMissingData,
}

/// ValidationError is one constraint violation found in a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{path}: type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("{path}: value {value} outside {bound}")]
    OutOfRange {
        path: String,
        value: String,
        bound: String,
    },

    #[error("{path}: value {value:?} does not match pattern {pattern:?}")]
    PatternMismatch {
        path: String,
        value: String,
        pattern: String,
    },

    #[error("{path}: {value:?} is not a valid enum value")]
    InvalidEnum { path: String, value: String },

    #[error("{path}: {value} matches no member type of the union")]
    InvalidUnion { path: String, value: String },

    #[error("{path}: key {key} is {expected} in the list but {actual} in the entry")]
    KeyMismatch {
        path: String,
        key: String,
        expected: String,
        actual: String,
    },

    #[error("{path}: leafref value {value} has no match at {target}")]
    MissingLeafref {
        path: String,
        value: String,
        target: String,
    },

    #[error("{path}: {message}")]
    Schema { path: String, message: String },
}

impl ValidationError {
    pub fn type_mismatch(path: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        ValidationError::TypeMismatch {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn out_of_range(path: impl Into<String>, value: impl Into<String>, bound: impl Into<String>) -> Self {
        ValidationError::OutOfRange {
            path: path.into(),
            value: value.into(),
            bound: bound.into(),
        }
    }

    pub fn pattern_mismatch(path: impl Into<String>, value: impl Into<String>, pattern: impl Into<String>) -> Self {
        ValidationError::PatternMismatch {
            path: path.into(),
            value: value.into(),
            pattern: pattern.into(),
        }
    }

    pub fn invalid_enum(path: impl Into<String>, value: impl Into<String>) -> Self {
        ValidationError::InvalidEnum {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn invalid_union(path: impl Into<String>, value: impl Into<String>) -> Self {
        ValidationError::InvalidUnion {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn key_mismatch(
        path: impl Into<String>,
        key: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        ValidationError::KeyMismatch {
            path: path.into(),
            key: key.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_leafref(path: impl Into<String>, value: impl Into<String>, target: impl Into<String>) -> Self {
        ValidationError::MissingLeafref {
            path: path.into(),
            value: value.into(),
            target: target.into(),
        }
    }

    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the data path the error refers to.
    pub fn path(&self) -> &str {
        match self {
            ValidationError::TypeMismatch { path, .. }
            | ValidationError::OutOfRange { path, .. }
            | ValidationError::PatternMismatch { path, .. }
            | ValidationError::InvalidEnum { path, .. }
            | ValidationError::InvalidUnion { path, .. }
            | ValidationError::KeyMismatch { path, .. }
            | ValidationError::MissingLeafref { path, .. }
            | ValidationError::Schema { path, .. } => path,
        }
    }
}

/// ValidationErrors is a collection of validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Creates a new empty ValidationErrors.
    pub fn new() -> Self {
        ValidationErrors { errors: Vec::new() }
    }

    /// Adds an error.
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Extends with another ValidationErrors.
    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    /// Returns true if there are no errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns an iterator over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::out_of_range("/interfaces/interface[name=eth0]/config/mtu", "10", "range 64..9216");
        assert_eq!(
            err.to_string(),
            "/interfaces/interface[name=eth0]/config/mtu: value 10 outside range 64..9216"
        );
        assert_eq!(err.path(), "/interfaces/interface[name=eth0]/config/mtu");
    }

    #[test]
    fn test_validation_errors_collection() {
        let mut errs = ValidationErrors::new();
        assert!(errs.is_empty());

        errs.add(ValidationError::invalid_enum("/a", "bogus"));
        let mut more = ValidationErrors::new();
        more.add(ValidationError::schema("/b", "no schema"));
        errs.extend(more);
        assert_eq!(errs.len(), 2);
        assert_eq!(errs.to_string().lines().count(), 2);
    }
}
