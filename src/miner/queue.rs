//! Bounded identifier queue
//!
//! A fixed-capacity FIFO handing identifiers from the feeder (single writer)
//! to the dispatcher (single reader). Pushing suspends while the queue is
//! full, so peak memory is bounded by the capacity rather than by the size
//! of the input.

use crate::miner::item::Identifier;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Creates a queue holding at most `capacity` identifiers
///
/// # Panics
///
/// Panics if `capacity` is zero; configuration validation rejects that value.
pub fn bounded(capacity: usize) -> (QueueWriter, QueueReader) {
    let (tx, rx) = mpsc::channel(capacity);
    let all_queued = Arc::new(AtomicBool::new(false));

    (
        QueueWriter {
            tx,
            all_queued: Arc::clone(&all_queued),
        },
        QueueReader {
            rx,
            all_queued,
            capacity,
        },
    )
}

/// Writing half, owned by the feeder
#[derive(Debug)]
pub struct QueueWriter {
    tx: mpsc::Sender<Identifier>,
    all_queued: Arc<AtomicBool>,
}

impl QueueWriter {
    /// Pushes an identifier, suspending while the queue is full
    ///
    /// Fails only when the reader has been dropped; the identifier is handed
    /// back in that case.
    pub async fn push(&self, identifier: Identifier) -> Result<(), Identifier> {
        self.tx.send(identifier).await.map_err(|e| e.0)
    }

    /// Marks the input as exhausted and closes the writing side
    pub fn finish(self) {
        self.all_queued.store(true, Ordering::Release);
    }
}

/// Reading half, owned by the dispatcher
#[derive(Debug)]
pub struct QueueReader {
    rx: mpsc::Receiver<Identifier>,
    all_queued: Arc<AtomicBool>,
    capacity: usize,
}

impl QueueReader {
    /// Pops the next identifier in FIFO order
    ///
    /// Suspends while the queue is empty and feeding continues. Returns
    /// `None` once the writer is gone and every queued identifier has been
    /// popped.
    pub async fn pop(&mut self) -> Option<Identifier> {
        self.rx.recv().await
    }

    /// Whether the feeder has queued every identifier
    pub fn all_queued(&self) -> bool {
        self.all_queued.load(Ordering::Acquire)
    }

    /// Number of identifiers currently buffered
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once all identifiers are queued and none remain buffered
    pub fn is_drained(&self) -> bool {
        self.all_queued() && self.rx.is_empty()
    }
}
