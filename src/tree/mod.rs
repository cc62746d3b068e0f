//! Unbalanced, copy-on-write binary search tree over string keys.
//!
//! Nodes are reference-counted so that a frozen version of the tree (a
//! [`Snapshot`](crate::Snapshot)) can be handed to readers while the writer
//! keeps going. The writer descends with [`ReferenceCounter::make_mut`]: a
//! node that no reader holds is updated in place, a shared node is cloned
//! first and the reader keeps the old one.
//!
//! No rebalancing is ever performed. Insertion order alone decides the shape,
//! so a sorted insertion sequence produces a tree as deep as it is long. Every
//! walk in this module is therefore a loop over an explicit stack or queue,
//! and dropping a node releases its subtree iteratively.

mod traversal;

use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::MapError;

pub use traversal::{InOrder, LevelOrder, PreOrder};

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted pointer shared between the writer and snapshots.
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

/// An owning edge to a child (or to the root).
pub(crate) type Link = Option<ReferenceCounter<Node>>;

// =============================================================================
// Node Definition
// =============================================================================

/// A single entry of the tree.
///
/// Every key in `left` is strictly less than `key`, every key in `right`
/// strictly greater.
#[derive(Clone)]
pub(crate) struct Node {
    pub(crate) key: String,
    pub(crate) value: String,
    pub(crate) left: Link,
    pub(crate) right: Link,
}

impl Node {
    /// Creates a node with no children.
    const fn leaf(key: String, value: String) -> Self {
        Self {
            key,
            value,
            left: None,
            right: None,
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        // A degenerate tree is a linked list; recursive drop would overflow.
        let mut pending: Vec<ReferenceCounter<Self>> = Vec::new();
        pending.extend(self.left.take());
        pending.extend(self.right.take());

        while let Some(node) = pending.pop() {
            if let Ok(mut node) = ReferenceCounter::try_unwrap(node) {
                pending.extend(node.left.take());
                pending.extend(node.right.take());
            }
        }
    }
}

// =============================================================================
// Insertion
// =============================================================================

/// What an insertion did to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The key was absent and a new node was linked in.
    Created,
    /// The key was present and its value was overwritten in place.
    Replaced,
}

impl InsertOutcome {
    /// Returns `true` if a new node was created.
    #[inline]
    pub const fn is_created(self) -> bool {
        matches!(self, Self::Created)
    }

    /// Returns `true` if an existing value was overwritten.
    #[inline]
    pub const fn is_replaced(self) -> bool {
        matches!(self, Self::Replaced)
    }
}

/// Inserts `key` into the tree rooted at `root`.
///
/// Greater keys descend right, lesser keys descend left; an equal key has its
/// value overwritten and no node is created.
pub(crate) fn insert(root: &mut Link, key: String, value: String) -> InsertOutcome {
    let mut slot = root;

    while let Some(node) = slot {
        let node = ReferenceCounter::make_mut(node);
        match key.as_str().cmp(node.key.as_str()) {
            Ordering::Less => slot = &mut node.left,
            Ordering::Greater => slot = &mut node.right,
            Ordering::Equal => {
                tracing::trace!(key = %node.key, "replaced value");
                node.value = value;
                return InsertOutcome::Replaced;
            }
        }
    }

    tracing::trace!(key = %key, "created node");
    *slot = Some(ReferenceCounter::new(Node::leaf(key, value)));
    InsertOutcome::Created
}

// =============================================================================
// Lookup
// =============================================================================

/// Finds the node holding `key`.
///
/// # Errors
///
/// [`MapError::Uninitialized`] if the tree is empty, [`MapError::KeyNotFound`]
/// if descent reaches an absent child first.
pub(crate) fn find<'a>(
    root: &'a Link,
    key: &str,
) -> Result<&'a ReferenceCounter<Node>, MapError> {
    let mut current = root.as_ref().ok_or(MapError::Uninitialized)?;

    loop {
        let next = match key.cmp(current.key.as_str()) {
            Ordering::Equal => return Ok(current),
            Ordering::Less => current.left.as_ref(),
            Ordering::Greater => current.right.as_ref(),
        };
        current = next.ok_or(MapError::KeyNotFound)?;
    }
}

/// Number of nodes on the longest root-to-leaf path.
pub(crate) fn height(root: &Link) -> usize {
    let mut queue: VecDeque<(&Node, usize)> = VecDeque::new();
    queue.extend(root.as_deref().map(|node| (node, 1)));

    let mut deepest = 0;
    while let Some((node, depth)) = queue.pop_front() {
        deepest = deepest.max(depth);
        for child in [&node.left, &node.right] {
            queue.extend(child.as_deref().map(|child| (child, depth + 1)));
        }
    }
    deepest
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn build(keys: &[&str]) -> Link {
        let mut root = None;
        for key in keys {
            insert(&mut root, (*key).to_string(), key.to_uppercase());
        }
        root
    }

    fn key_of(link: &Link) -> Option<&str> {
        link.as_deref().map(|node| node.key.as_str())
    }

    #[rstest]
    fn test_first_insert_becomes_root() {
        let mut root = None;
        assert_eq!(
            insert(&mut root, "m".to_string(), "1".to_string()),
            InsertOutcome::Created
        );
        assert_eq!(key_of(&root), Some("m"));
    }

    #[rstest]
    fn test_insert_links_lesser_left_and_greater_right() {
        let root = build(&["b", "a", "c"]);
        let node = root.as_deref().unwrap();
        assert_eq!(node.key, "b");
        assert_eq!(key_of(&node.left), Some("a"));
        assert_eq!(key_of(&node.right), Some("c"));
    }

    #[rstest]
    fn test_equal_key_overwrites_without_new_node() {
        let mut root = build(&["b", "a"]);
        let outcome = insert(&mut root, "a".to_string(), "second".to_string());
        assert_eq!(outcome, InsertOutcome::Replaced);

        let node = root.as_deref().unwrap();
        let left = node.left.as_deref().unwrap();
        assert_eq!(left.value, "second");
        assert!(left.left.is_none());
        assert!(left.right.is_none());
    }

    #[rstest]
    fn test_insert_copies_only_shared_nodes() {
        let mut root = build(&["b", "a", "c"]);
        let frozen = root.clone();

        insert(&mut root, "d".to_string(), "D".to_string());

        let frozen_right = frozen.as_deref().unwrap().right.as_deref().unwrap();
        assert!(frozen_right.right.is_none());
        let live_right = root.as_deref().unwrap().right.as_deref().unwrap();
        assert_eq!(key_of(&live_right.right), Some("d"));

        // The untouched left subtree is still shared.
        assert!(ReferenceCounter::ptr_eq(
            frozen.as_ref().unwrap().left.as_ref().unwrap(),
            root.as_ref().unwrap().left.as_ref().unwrap(),
        ));
    }

    #[rstest]
    fn test_find_on_empty_tree_is_uninitialized() {
        let root: Link = None;
        assert_eq!(find(&root, "a").err(), Some(MapError::Uninitialized));
    }

    #[rstest]
    #[case("a", Ok("A"))]
    #[case("m", Ok("M"))]
    #[case("t", Ok("T"))]
    #[case("z", Err(MapError::KeyNotFound))]
    #[case("", Err(MapError::KeyNotFound))]
    fn test_find(#[case] key: &str, #[case] expected: Result<&str, MapError>) {
        let root = build(&["m", "f", "t", "a"]);
        let found = find(&root, key).map(|node| node.value.as_str());
        assert_eq!(found, expected);
    }

    #[rstest]
    fn test_empty_string_key_is_ordinary() {
        let mut root = build(&["m"]);
        insert(&mut root, String::new(), "empty".to_string());
        assert_eq!(find(&root, "").map(|node| node.value.as_str()), Ok("empty"));
    }

    #[rstest]
    #[case(&[], 0)]
    #[case(&["b"], 1)]
    #[case(&["b", "a", "c"], 2)]
    #[case(&["a", "b", "c", "d"], 4)]
    fn test_height(#[case] keys: &[&str], #[case] expected: usize) {
        assert_eq!(height(&build(keys)), expected);
    }

    #[rstest]
    fn test_degenerate_tree_drops_without_overflow() {
        let mut root: Link = None;
        for index in 0..200_000 {
            root = Some(ReferenceCounter::new(Node {
                key: format!("{index:08}"),
                value: String::new(),
                left: root,
                right: None,
            }));
        }
        assert_eq!(height(&root), 200_000);
        drop(root);
    }
}
