//! # bstree-map
//!
//! An in-memory ordered map from `String` keys to `String` values, backed by
//! an unbalanced binary search tree.
//!
//! ## Overview
//!
//! - **Point operations**: [`OrderedMap::insert`], [`OrderedMap::get`],
//!   [`OrderedMap::has_key`].
//! - **Eager traversal**: [`OrderedMap::entries`] collects every entry,
//!   walking the tree in pre-order.
//! - **Lazy traversal**: [`OrderedMap::lazy_iter`] streams entries in batches
//!   from a background task, walking the tree breadth-first.
//! - **Snapshots**: [`OrderedMap::snapshot`] freezes one version of the tree
//!   for lock-free, consistent reads.
//!
//! Keys are compared lexicographically. The tree is never rebalanced and
//! entries are never removed.
//!
//! ## Concurrency
//!
//! Inserts are serialized by an exclusive guard held for the whole insertion.
//! Nodes are copy-on-write, so every read works on a frozen version of the
//! tree and never observes a half-finished insert.
//!
//! ## Feature Flags
//!
//! - `async` (default): lazy batched traversal on tokio.
//! - `serde`: `Serialize` for [`Snapshot`] and [`OrderedMap`],
//!   `Deserialize` for [`OrderedMap`].
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use bstree_map::prelude::*;
//!
//! let map = OrderedMap::new();
//! map.insert("m", "1");
//! map.insert("f", "2");
//!
//! assert_eq!(map.get("f").unwrap(), "2");
//! assert_eq!(map.get("q").unwrap_err(), MapError::KeyNotFound);
//!
//! let snapshot = map.snapshot();
//! let keys: Vec<&str> = snapshot.sorted().map(|(key, _)| key).collect();
//! assert_eq!(keys, ["f", "m"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use bstree_map::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::MapError;
    pub use crate::map::OrderedMap;
    pub use crate::snapshot::{Entries, Snapshot, ValueRef};
    pub use crate::tree::InsertOutcome;

    #[cfg(feature = "async")]
    pub use crate::lazy::{Batch, BatchStream, TraversalReport};
}

mod error;
mod map;
mod snapshot;
mod tree;

#[cfg(feature = "async")]
pub mod lazy;

pub use error::MapError;
pub use map::OrderedMap;
pub use snapshot::{Entries, Snapshot, ValueRef};
pub use tree::{InOrder, InsertOutcome, LevelOrder, PreOrder};

#[cfg(feature = "async")]
pub use lazy::{Batch, BatchStream, TraversalReport};
