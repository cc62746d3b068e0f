//! Lazy, batched traversal running on a background task.
//!
//! [`OrderedMap::lazy_iter`] freezes the current version of the tree and
//! spawns a producer that walks it breadth-first, handing entries to the
//! caller in batches through a [`BatchStream`].
//!
//! # Handoff
//!
//! The channel between producer and consumer holds at most one pending
//! batch. The producer waits at each batch boundary until the consumer has
//! room, and yields its scheduling turn after every full batch.
//!
//! # Batching
//!
//! - After an entry is added, a batch holding exactly `batch_size` entries is
//!   handed off and a fresh one begins.
//! - When the tree is exhausted, the remaining entries (if any) are handed
//!   off as the final batch and the stream closes. Closing is the only
//!   termination signal.
//! - A `batch_size` of `0`, or one at least as large as the tree, yields a
//!   single batch.
//!
//! # Cancellation
//!
//! Dropping the stream, or calling [`BatchStream::cancel`], closes the
//! channel. The producer notices before building each entry and at each
//! handoff, and stops.
//!
//! # Examples
//!
//! ```rust
//! use bstree_map::OrderedMap;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let map = OrderedMap::new();
//! map.insert("b", "2");
//! map.insert("a", "1");
//! map.insert("c", "3");
//!
//! let mut batches = map.lazy_iter(1);
//! let mut order = Vec::new();
//! while let Some(batch) = batches.next_batch().await {
//!     order.extend(batch.into_keys());
//! }
//! assert_eq!(order, ["b", "a", "c"]);
//! # }
//! ```

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use futures::stream::FusedStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::MapError;
use crate::map::OrderedMap;
use crate::snapshot::{Entries, Snapshot};

/// One unit handed off by the lazy traversal.
pub type Batch = Entries;

/// Pending batches the channel may hold.
const HANDOFF_CAPACITY: usize = 1;

// =============================================================================
// TraversalReport
// =============================================================================

/// What a producer handed off before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalReport {
    /// Batches accepted by the channel.
    pub batches: usize,
    /// Entries across those batches.
    pub entries: usize,
    /// `true` if the whole tree was handed off.
    pub completed: bool,
}

impl TraversalReport {
    const fn finished() -> Self {
        Self {
            batches: 0,
            entries: 0,
            completed: true,
        }
    }
}

// =============================================================================
// BatchStream
// =============================================================================

/// The consumer end of a lazy traversal.
///
/// Implements [`Stream`]; batches can also be pulled with
/// [`next_batch`](Self::next_batch) or, from a thread outside any async
/// runtime, [`blocking_next_batch`](Self::blocking_next_batch).
#[derive(Debug)]
pub struct BatchStream {
    receiver: Option<mpsc::Receiver<Batch>>,
    producer: Option<JoinHandle<TraversalReport>>,
}

impl BatchStream {
    /// A stream that yields nothing, returned for an empty map.
    const fn empty() -> Self {
        Self {
            receiver: None,
            producer: None,
        }
    }

    /// Returns `true` if no producer was started because the map was empty.
    #[inline]
    pub const fn is_noop(&self) -> bool {
        self.producer.is_none()
    }

    /// Receives the next batch, or `None` once the stream has closed.
    pub async fn next_batch(&mut self) -> Option<Batch> {
        match self.receiver.as_mut() {
            Some(receiver) => receiver.recv().await,
            None => None,
        }
    }

    /// Receives the next batch, blocking the current thread.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_next_batch(&mut self) -> Option<Batch> {
        self.receiver.as_mut()?.blocking_recv()
    }

    /// Stops the traversal and waits for the producer to exit.
    ///
    /// A batch already waiting in the channel is discarded. Cancelling a
    /// stream that was read to the end just reports the completed traversal.
    ///
    /// # Errors
    ///
    /// [`MapError::Traversal`] if the producer task panicked or was aborted.
    pub async fn cancel(mut self) -> Result<TraversalReport, MapError> {
        if let Some(mut receiver) = self.receiver.take() {
            receiver.close();
        }
        match self.producer.take() {
            Some(producer) => Ok(producer.await?),
            None => Ok(TraversalReport::finished()),
        }
    }
}

impl Stream for BatchStream {
    type Item = Batch;

    fn poll_next(self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Option<Batch>> {
        match self.get_mut().receiver.as_mut() {
            Some(receiver) => receiver.poll_recv(context),
            None => Poll::Ready(None),
        }
    }
}

impl FusedStream for BatchStream {
    fn is_terminated(&self) -> bool {
        self.receiver
            .as_ref()
            .is_none_or(|receiver| receiver.is_closed() && receiver.is_empty())
    }
}

static_assertions::assert_impl_all!(BatchStream: Send, Unpin);

// =============================================================================
// Entry Points
// =============================================================================

impl OrderedMap {
    /// Streams the current version of the map in batches of `batch_size`,
    /// walking the tree breadth-first on a task spawned onto the ambient
    /// tokio runtime.
    ///
    /// Returns a no-op stream if the map is empty.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime; use
    /// [`lazy_iter_on`](Self::lazy_iter_on) to name one explicitly.
    pub fn lazy_iter(&self, batch_size: usize) -> BatchStream {
        self.lazy_iter_on(&Handle::current(), batch_size)
    }

    /// Like [`lazy_iter`](Self::lazy_iter), spawning the producer on
    /// `handle`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bstree_map::OrderedMap;
    ///
    /// let runtime = tokio::runtime::Runtime::new().unwrap();
    /// let map: OrderedMap = [("b", "2"), ("a", "1"), ("c", "3")].into_iter().collect();
    ///
    /// let mut batches = map.lazy_iter_on(runtime.handle(), 2);
    /// assert_eq!(batches.blocking_next_batch().map(|batch| batch.len()), Some(2));
    /// assert_eq!(batches.blocking_next_batch().map(|batch| batch.len()), Some(1));
    /// assert_eq!(batches.blocking_next_batch(), None);
    /// ```
    pub fn lazy_iter_on(&self, handle: &Handle, batch_size: usize) -> BatchStream {
        spawn_traversal(self.snapshot(), handle, batch_size)
    }
}

fn spawn_traversal(snapshot: Snapshot, handle: &Handle, batch_size: usize) -> BatchStream {
    if snapshot.is_empty() {
        return BatchStream::empty();
    }

    tracing::debug!(batch_size, nodes = snapshot.len(), "starting lazy traversal");
    let (sender, receiver) = mpsc::channel(HANDOFF_CAPACITY);
    let producer = handle.spawn(produce(snapshot, batch_size, sender));

    BatchStream {
        receiver: Some(receiver),
        producer: Some(producer),
    }
}

// =============================================================================
// Producer
// =============================================================================

/// Capacity to reserve for a fresh batch.
fn batch_capacity(batch_size: usize, nodes: usize) -> usize {
    if batch_size == 0 {
        nodes
    } else {
        batch_size.min(nodes)
    }
}

async fn produce(
    snapshot: Snapshot,
    batch_size: usize,
    sender: mpsc::Sender<Batch>,
) -> TraversalReport {
    let capacity = batch_capacity(batch_size, snapshot.len());
    let mut report = TraversalReport::default();
    let mut batch = Batch::with_capacity(capacity);

    for (key, value) in snapshot.level_order() {
        if sender.is_closed() {
            tracing::debug!(
                batches = report.batches,
                entries = report.entries,
                "lazy traversal cancelled"
            );
            return report;
        }

        batch.insert(key.to_owned(), value.to_owned());
        if batch.len() == batch_size {
            let full = std::mem::replace(&mut batch, Batch::with_capacity(capacity));
            if !hand_off(&sender, full, &mut report).await {
                return report;
            }
            tokio::task::yield_now().await;
        }
    }

    if !batch.is_empty() && !hand_off(&sender, batch, &mut report).await {
        return report;
    }

    report.completed = true;
    tracing::debug!(
        batches = report.batches,
        entries = report.entries,
        "lazy traversal finished"
    );
    report
}

/// Sends one batch. Returns `false` if the consumer has gone away.
async fn hand_off(
    sender: &mpsc::Sender<Batch>,
    batch: Batch,
    report: &mut TraversalReport,
) -> bool {
    let entries = batch.len();
    if sender.send(batch).await.is_err() {
        tracing::debug!(
            batches = report.batches,
            entries = report.entries,
            "lazy traversal cancelled"
        );
        return false;
    }

    report.batches += 1;
    report.entries += entries;
    tracing::trace!(batch = report.batches, entries, "handed off batch");
    true
}
