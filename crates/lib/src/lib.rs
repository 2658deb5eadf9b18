//! Nestmap: nested, path-addressable maps of sets with bubbling change events.
//!
//! ## Core Concepts
//!
//! * **Paths (`path::Path`)**: Ordered sequences of keys addressing a location in the tree.
//! * **Values (`value::Value`)**: Primitive, hashable leaf payloads.
//! * **Sets (`set::NestedSet`)**: Unique leaf values living at one location.
//! * **Maps (`map::NestedMap`)**: Recursive containers mapping each key to a set or another map.
//!   Every map tracks the number of leaf values below it.
//! * **Events (`event::Event`)**: Add, delete and clear notifications. An event raised deep in the
//!   tree is re-emitted by every ancestor with its path extended by the child's key, so listeners
//!   on any container see all changes below it.
//! * **Shared maps (`shared::SharedMap`)**: Reference-counted maps that listeners may mutate,
//!   with queued, ordered delivery.

pub mod errors;
pub mod event;
pub mod map;
pub mod path;
pub mod set;
pub mod shared;
pub mod value;

pub use errors::{ContainerError, ContainerKind};
pub use event::{Event, EventKind, EventKinds, Observable, SubscriptionId};
pub use map::{ContainerRef, MapOptions, NestedMap, Node, Resolve};
pub use path::{Key, Path, PathBuf, PathError, to_path};
pub use set::NestedSet;
pub use shared::{Applied, SharedMap, WeakSharedMap};
pub use value::Value;

/// Result type used throughout the Nestmap library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Common error type for the Nestmap library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured path errors from the path module
    #[error(transparent)]
    Path(#[from] path::PathError),

    /// Structured container errors from the map and set modules
    #[error(transparent)]
    Container(errors::ContainerError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Path(_) => "path",
            Error::Container(_) => "container",
            Error::Json(_) => "json",
        }
    }

    /// Check if this error is a type mismatch.
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::Container(container_err) => container_err.is_type_error(),
            _ => false,
        }
    }

    /// Check if this error was caused by unusable input.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Error::Path(_) | Error::Json(_) => true,
            Error::Container(container_err) => container_err.is_invalid_input(),
        }
    }

    /// Check if this error was caused by re-entrant access to a shared map.
    pub fn is_busy(&self) -> bool {
        match self {
            Error::Container(container_err) => container_err.is_busy(),
            _ => false,
        }
    }

    /// Get the path if this is a location-related error.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Error::Container(container_err) => container_err.path(),
            _ => None,
        }
    }
}
