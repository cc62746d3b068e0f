//! Borrowing walks over a tree.
//!
//! Three orders are offered and they are not interchangeable:
//!
//! - [`PreOrder`]: node, then left subtree, then right subtree. Used by
//!   [`Snapshot::entries`](crate::Snapshot::entries).
//! - [`LevelOrder`]: breadth-first from the root, left child enqueued before
//!   right. Used by the lazy batched traversal.
//! - [`InOrder`]: ascending key order.

use std::collections::VecDeque;
use std::iter::FusedIterator;

use smallvec::SmallVec;

use super::{Link, Node};

/// Inline capacity of the explicit stacks; deeper trees spill to the heap.
const INLINE_DEPTH: usize = 32;

#[inline]
fn entry(node: &Node) -> (&str, &str) {
    (node.key.as_str(), node.value.as_str())
}

// =============================================================================
// PreOrder
// =============================================================================

/// Pre-order iterator over `(key, value)` pairs.
#[derive(Clone)]
pub struct PreOrder<'a> {
    stack: SmallVec<[&'a Node; INLINE_DEPTH]>,
}

impl<'a> PreOrder<'a> {
    pub(crate) fn new(root: &'a Link) -> Self {
        let mut stack = SmallVec::new();
        stack.extend(root.as_deref());
        Self { stack }
    }
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Right first so that the left subtree is popped first.
        self.stack.extend(node.right.as_deref());
        self.stack.extend(node.left.as_deref());
        Some(entry(node))
    }
}

impl FusedIterator for PreOrder<'_> {}

// =============================================================================
// LevelOrder
// =============================================================================

/// Breadth-first iterator over `(key, value)` pairs.
#[derive(Clone)]
pub struct LevelOrder<'a> {
    queue: VecDeque<&'a Node>,
}

impl<'a> LevelOrder<'a> {
    pub(crate) fn new(root: &'a Link) -> Self {
        let mut queue = VecDeque::new();
        queue.extend(root.as_deref());
        Self { queue }
    }
}

impl<'a> Iterator for LevelOrder<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;
        self.queue.extend(node.left.as_deref());
        self.queue.extend(node.right.as_deref());
        Some(entry(node))
    }
}

impl FusedIterator for LevelOrder<'_> {}

// =============================================================================
// InOrder
// =============================================================================

/// Ascending-key iterator over `(key, value)` pairs.
#[derive(Clone)]
pub struct InOrder<'a> {
    stack: SmallVec<[&'a Node; INLINE_DEPTH]>,
}

impl<'a> InOrder<'a> {
    pub(crate) fn new(root: &'a Link) -> Self {
        let mut iterator = Self {
            stack: SmallVec::new(),
        };
        iterator.push_left_spine(root.as_deref());
        iterator
    }

    fn push_left_spine(&mut self, mut node: Option<&'a Node>) {
        while let Some(current) = node {
            self.stack.push(current);
            node = current.left.as_deref();
        }
    }
}

impl<'a> Iterator for InOrder<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_deref());
        Some(entry(node))
    }
}

impl FusedIterator for InOrder<'_> {}
