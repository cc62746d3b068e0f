//! Frozen, lock-free views of an [`OrderedMap`](crate::OrderedMap).
//!
//! A [`Snapshot`] holds the root of one version of the tree. Because nodes
//! are copy-on-write, later inserts into the map never alter a snapshot that
//! was already taken: every read performed through it sees one consistent
//! tree.

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;

use crate::MapError;
use crate::tree::{
    self, InOrder, InsertOutcome, LevelOrder, Link, Node, PreOrder, ReferenceCounter,
};

/// A materialized mapping of every key to its value.
///
/// Iteration order over the mapping is unspecified.
pub type Entries = HashMap<String, String>;

// =============================================================================
// Snapshot Definition
// =============================================================================

/// An immutable version of the tree.
///
/// Obtained from [`OrderedMap::snapshot`](crate::OrderedMap::snapshot).
/// Cloning a snapshot is O(1).
///
/// # Examples
///
/// ```rust
/// use bstree_map::OrderedMap;
///
/// let map = OrderedMap::new();
/// map.insert("b", "1");
///
/// let snapshot = map.snapshot();
/// map.insert("a", "2");
///
/// assert_eq!(snapshot.len(), 1);
/// assert!(!snapshot.has_key("a").unwrap());
/// assert!(map.has_key("a").unwrap());
/// ```
#[derive(Clone, Default)]
pub struct Snapshot {
    root: Link,
    length: usize,
}

impl Snapshot {
    /// The snapshot of an empty map.
    pub(crate) const fn empty() -> Self {
        Self {
            root: None,
            length: 0,
        }
    }

    /// Inserts directly into this version. Only the map's writer calls this,
    /// under its exclusive guard.
    pub(crate) fn insert_in_place(&mut self, key: String, value: String) -> InsertOutcome {
        let outcome = tree::insert(&mut self.root, key, value);
        if outcome.is_created() {
            self.length += 1;
        }
        outcome
    }

    /// Returns the number of entries.
    #[inline]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if nothing was ever inserted.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of nodes on the longest root-to-leaf path.
    ///
    /// Equals [`len`](Self::len) when keys were inserted in sorted order.
    pub fn height(&self) -> usize {
        tree::height(&self.root)
    }

    /// Looks up `key`.
    ///
    /// The returned [`ValueRef`] aliases the stored value rather than copying
    /// it, and stays valid for as long as it is held.
    ///
    /// # Errors
    ///
    /// - [`MapError::Uninitialized`] if the snapshot is empty.
    /// - [`MapError::KeyNotFound`] if `key` was never inserted.
    pub fn get(&self, key: &str) -> Result<ValueRef, MapError> {
        tree::find(&self.root, key).map(|node| ValueRef {
            node: ReferenceCounter::clone(node),
        })
    }

    /// Returns whether `key` is present.
    ///
    /// An absent key is reported as `Ok(false)`.
    ///
    /// # Errors
    ///
    /// [`MapError::Uninitialized`] if the snapshot is empty.
    pub fn has_key(&self, key: &str) -> Result<bool, MapError> {
        match tree::find(&self.root, key) {
            Ok(_) => Ok(true),
            Err(MapError::KeyNotFound) => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Collects every entry, visiting the tree in pre-order.
    ///
    /// # Errors
    ///
    /// [`MapError::Uninitialized`] if the snapshot is empty.
    pub fn entries(&self) -> Result<Entries, MapError> {
        if self.root.is_none() {
            return Err(MapError::Uninitialized);
        }
        let mut entries = Entries::with_capacity(self.length);
        entries.extend(
            self.pre_order()
                .map(|(key, value)| (key.to_owned(), value.to_owned())),
        );
        tracing::debug!(entries = entries.len(), "collected entries");
        Ok(entries)
    }

    /// Walks the tree node, left subtree, right subtree.
    pub fn pre_order(&self) -> PreOrder<'_> {
        PreOrder::new(&self.root)
    }

    /// Walks the tree breadth-first, left child before right child.
    pub fn level_order(&self) -> LevelOrder<'_> {
        LevelOrder::new(&self.root)
    }

    /// Walks the tree in ascending key order.
    pub fn sorted(&self) -> InOrder<'_> {
        InOrder::new(&self.root)
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.sorted()).finish()
    }
}

impl PartialEq for Snapshot {
    /// Two snapshots are equal when they hold the same entries, whatever
    /// their shapes.
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && self.sorted().eq(other.sorted())
    }
}

impl Eq for Snapshot {}

#[cfg(feature = "serde")]
impl serde::Serialize for Snapshot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.sorted() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// =============================================================================
// ValueRef
// =============================================================================

/// A handle to a stored value.
///
/// Keeps the node it was read from alive, so it reads the value as it was
/// when the lookup happened even if the key is overwritten afterwards.
///
/// # Examples
///
/// ```rust
/// use bstree_map::OrderedMap;
///
/// let map = OrderedMap::new();
/// map.insert("k", "first");
///
/// let value = map.get("k").unwrap();
/// map.insert("k", "second");
///
/// assert_eq!(value, "first");
/// assert_eq!(map.get("k").unwrap(), "second");
/// ```
#[derive(Clone)]
pub struct ValueRef {
    node: ReferenceCounter<Node>,
}

impl ValueRef {
    /// The key this value is stored under.
    #[inline]
    pub fn key(&self) -> &str {
        &self.node.key
    }

    /// Copies the value out.
    #[inline]
    pub fn into_string(self) -> String {
        self.node.value.clone()
    }
}

impl Deref for ValueRef {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        &self.node.value
    }
}

impl AsRef<str> for ValueRef {
    #[inline]
    fn as_ref(&self) -> &str {
        self
    }
}

impl fmt::Debug for ValueRef {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, formatter)
    }
}

impl fmt::Display for ValueRef {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self)
    }
}

impl PartialEq for ValueRef {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl Eq for ValueRef {}

impl PartialEq<str> for ValueRef {
    fn eq(&self, other: &str) -> bool {
        &**self == other
    }
}

impl PartialEq<&str> for ValueRef {
    fn eq(&self, other: &&str) -> bool {
        &**self == *other
    }
}

impl PartialEq<String> for ValueRef {
    fn eq(&self, other: &String) -> bool {
        &**self == other.as_str()
    }
}
