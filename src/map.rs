//! The shared, concurrently usable ordered map.
//!
//! [`OrderedMap`] owns the current version of the tree behind a read-write
//! lock. Inserts take the write guard for the whole descent, so concurrent
//! inserts serialize completely. Reads take the read guard only long enough
//! to clone the root into a [`Snapshot`] and then work without any lock.

use std::fmt;

use parking_lot::RwLock;

use crate::MapError;
use crate::snapshot::{Entries, Snapshot, ValueRef};
use crate::tree::InsertOutcome;

// =============================================================================
// OrderedMap Definition
// =============================================================================

/// An ordered map from `String` keys to `String` values backed by an
/// unbalanced binary search tree.
///
/// Keys compare lexicographically (byte order). The tree is never rebalanced,
/// so its depth depends on insertion order: O(log N) on average for random
/// order, O(N) when keys arrive sorted.
///
/// All methods take `&self`; share the map between threads with
/// [`std::sync::Arc`].
///
/// # Time Complexity
///
/// | Operation     | Complexity           |
/// |---------------|----------------------|
/// | `insert`      | O(depth)             |
/// | `get`         | O(depth)             |
/// | `has_key`     | O(depth)             |
/// | `entries`     | O(N)                 |
/// | `snapshot`    | O(1)                 |
/// | `len`         | O(1)                 |
///
/// # Examples
///
/// ```rust
/// use bstree_map::{MapError, OrderedMap};
///
/// let map = OrderedMap::new();
/// map.insert("m", "1");
/// map.insert("f", "2");
/// map.insert("t", "3");
/// map.insert("a", "4");
///
/// assert_eq!(map.get("f").unwrap(), "2");
/// assert!(map.has_key("f").unwrap());
/// assert!(!map.has_key("z").unwrap());
/// assert_eq!(map.get("z").unwrap_err(), MapError::KeyNotFound);
///
/// let entries = map.entries().unwrap();
/// assert_eq!(entries.len(), 4);
/// assert_eq!(entries["a"], "4");
/// ```
pub struct OrderedMap {
    current: RwLock<Snapshot>,
}

impl OrderedMap {
    /// Creates an empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bstree_map::OrderedMap;
    ///
    /// let map = OrderedMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: parking_lot::const_rwlock(Snapshot::empty()),
        }
    }

    /// Inserts `value` under `key`.
    ///
    /// If the tree is empty the entry becomes the root. Otherwise the tree is
    /// descended from the root, right for greater keys and left for lesser
    /// ones, until a free slot is found; an equal key has its value
    /// overwritten and no node is created.
    ///
    /// Holds the exclusive guard for the whole call.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bstree_map::{InsertOutcome, OrderedMap};
    ///
    /// let map = OrderedMap::new();
    /// assert_eq!(map.insert("k", "v1"), InsertOutcome::Created);
    /// assert_eq!(map.insert("k", "v2"), InsertOutcome::Replaced);
    /// assert_eq!(map.len(), 1);
    /// assert_eq!(map.get("k").unwrap(), "v2");
    /// ```
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) -> InsertOutcome {
        let (key, value) = (key.into(), value.into());
        self.current.write().insert_in_place(key, value)
    }

    /// Takes a frozen version of the map.
    ///
    /// Inserts that complete after this call are not visible through the
    /// returned snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.current.read().clone()
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    /// Returns `true` if nothing was ever inserted.
    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }

    /// Looks up `key` in the current version.
    ///
    /// # Errors
    ///
    /// - [`MapError::Uninitialized`] if the map is empty.
    /// - [`MapError::KeyNotFound`] if `key` was never inserted.
    pub fn get(&self, key: &str) -> Result<ValueRef, MapError> {
        self.snapshot().get(key)
    }

    /// Returns whether `key` is present in the current version.
    ///
    /// # Errors
    ///
    /// [`MapError::Uninitialized`] if the map is empty.
    pub fn has_key(&self, key: &str) -> Result<bool, MapError> {
        self.snapshot().has_key(key)
    }

    /// Collects every entry of the current version, visiting the tree in
    /// pre-order.
    ///
    /// # Errors
    ///
    /// [`MapError::Uninitialized`] if the map is empty.
    pub fn entries(&self) -> Result<Entries, MapError> {
        self.snapshot().entries()
    }
}

impl Default for OrderedMap {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for OrderedMap {
    /// Creates an independent map starting from the current version.
    fn clone(&self) -> Self {
        Self {
            current: RwLock::new(self.snapshot()),
        }
    }
}

impl fmt::Debug for OrderedMap {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.snapshot(), formatter)
    }
}

impl From<Snapshot> for OrderedMap {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(snapshot),
        }
    }
}

impl<K, V> Extend<(K, V)> for OrderedMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iterable: I) {
        let current = self.current.get_mut();
        for (key, value) in iterable {
            current.insert_in_place(key.into(), value.into());
        }
    }
}

impl<K, V> FromIterator<(K, V)> for OrderedMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iterable: I) -> Self {
        let mut map = Self::new();
        map.extend(iterable);
        map
    }
}

static_assertions::assert_impl_all!(OrderedMap: Send, Sync);
static_assertions::assert_impl_all!(Snapshot: Send, Sync);
static_assertions::assert_impl_all!(ValueRef: Send, Sync);

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl serde::Serialize for OrderedMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serde::Serialize::serialize(&self.snapshot(), serializer)
    }
}

#[cfg(feature = "serde")]
struct OrderedMapVisitor;

#[cfg(feature = "serde")]
impl<'de> serde::de::Visitor<'de> for OrderedMapVisitor {
    type Value = OrderedMap;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of strings to strings")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        // Entries go in input order, which decides the tree shape.
        let mut map = OrderedMap::new();
        let current = map.current.get_mut();
        while let Some((key, value)) = access.next_entry::<String, String>()? {
            current.insert_in_place(key, value);
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for OrderedMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(OrderedMapVisitor)
    }
}
