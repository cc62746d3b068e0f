//! Error types for map operations.
//!
//! Every fallible operation in this crate reports a [`MapError`]. None of
//! them are fatal: the map stays usable after any error.

use thiserror::Error;

/// Errors reported by [`OrderedMap`](crate::OrderedMap),
/// [`Snapshot`](crate::Snapshot) and, with the `async` feature,
/// [`BatchStream`](crate::BatchStream).
///
/// # Examples
///
/// ```rust
/// use bstree_map::{MapError, OrderedMap};
///
/// let map = OrderedMap::new();
/// assert_eq!(map.get("missing").unwrap_err(), MapError::Uninitialized);
///
/// map.insert("present", "1");
/// assert_eq!(map.get("missing").unwrap_err(), MapError::KeyNotFound);
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    /// The map has no root yet: nothing was ever inserted.
    #[error("map is not initialized")]
    Uninitialized,

    /// Descent reached an absent child before matching the key.
    #[error("key not present")]
    KeyNotFound,

    /// The background traversal task panicked or was aborted.
    #[cfg(feature = "async")]
    #[error("lazy traversal task failed: {0}")]
    Traversal(String),
}

impl MapError {
    /// Returns `true` for [`MapError::KeyNotFound`].
    #[inline]
    pub const fn is_key_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound)
    }

    /// Returns `true` for [`MapError::Uninitialized`].
    #[inline]
    pub const fn is_uninitialized(&self) -> bool {
        matches!(self, Self::Uninitialized)
    }
}

#[cfg(feature = "async")]
impl From<tokio::task::JoinError> for MapError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Traversal(error.to_string())
    }
}
