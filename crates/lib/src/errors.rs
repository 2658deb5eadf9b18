//! Error types for container operations.
//!
//! This module defines structured error types for mutations and lookups on
//! [`NestedMap`](crate::NestedMap) and [`NestedSet`](crate::NestedSet),
//! providing context for type mismatches and unusable input.

use std::fmt;

use thiserror::Error;

use crate::path::{Key, PathBuf};

/// The kind of thing found (or expected) at a location in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// A leaf value
    Value,
    /// A set of leaf values
    Set,
    /// A nested map
    Map,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Value => write!(f, "value"),
            ContainerKind::Set => write!(f, "set"),
            ContainerKind::Map => write!(f, "map"),
        }
    }
}

/// Structured error types for container operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ContainerError {
    /// A location held a different kind of child than the operation needs
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: PathBuf,
        expected: ContainerKind,
        found: ContainerKind,
    },

    /// Input could not be stored as a leaf value
    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },

    /// Nested construction was given something other than a key/value object
    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: String },

    /// A shared container was read while one of its mutations was still
    /// delivering events
    #[error("container is busy delivering events")]
    Busy,
}

impl ContainerError {
    /// Check if this error is a type mismatch
    pub fn is_type_error(&self) -> bool {
        matches!(self, ContainerError::TypeMismatch { .. })
    }

    /// Check if this error was caused by unusable input
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            ContainerError::InvalidValue { .. } | ContainerError::NotAnObject { .. }
        )
    }

    /// Check if this error was caused by re-entrant access
    pub fn is_busy(&self) -> bool {
        matches!(self, ContainerError::Busy)
    }

    /// Get the path if this is a location-related error
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ContainerError::TypeMismatch { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Re-addresses a location-related error one level up.
    pub(crate) fn within(self, key: &Key) -> Self {
        match self {
            ContainerError::TypeMismatch {
                path,
                expected,
                found,
            } => ContainerError::TypeMismatch {
                path: path.prepend(key.clone()),
                expected,
                found,
            },
            other => other,
        }
    }
}

// Conversion from ContainerError to the main Error type
impl From<ContainerError> for crate::Error {
    fn from(err: ContainerError) -> Self {
        crate::Error::Container(err)
    }
}
