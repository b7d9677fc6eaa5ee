//! Worker dispatcher: drains the identifier queue under a concurrency cap
//!
//! This module handles:
//! - Popping identifiers from the bounded queue in FIFO order
//! - Global concurrency limiting via a semaphore of `worker_count` permits
//! - Spawning one fetch task per identifier on the runtime
//! - Forwarding every completion, success or failure, to the collector
//! - Cooperative cancellation at each suspension point

use crate::miner::fetcher::Fetcher;
use crate::miner::item::{Identifier, Item};
use crate::miner::queue::QueueReader;
use crate::{FetchError, MineError};
use std::sync::Arc;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;

/// Outcome of one dispatched identifier
#[derive(Debug)]
pub struct Completion {
    pub identifier: Identifier,
    pub result: Result<Item, FetchError>,
}

/// Counters produced by one dispatch loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Identifiers handed to a fetch task
    pub dispatched: u64,

    /// Highest number of permits held at once
    pub peak_in_flight: usize,
}

/// Dispatches fetch tasks with at most `worker_count` in flight
///
/// The permit pool is independent of the queue capacity: a permit is taken
/// after an identifier is popped and released when that identifier's
/// completion has been handed to the collector.
pub struct Dispatcher<F: ?Sized> {
    fetcher: Arc<F>,
    permits: Arc<Semaphore>,
    worker_count: usize,
}

impl<F> Dispatcher<F>
where
    F: Fetcher + ?Sized + 'static,
{
    /// Creates a dispatcher with `worker_count` permits
    ///
    /// # Panics
    ///
    /// Panics if `worker_count` is zero; configuration validation rejects that value.
    pub fn new(fetcher: Arc<F>, worker_count: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be at least 1");
        Self {
            fetcher,
            permits: Arc::new(Semaphore::new(worker_count)),
            worker_count,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Number of fetch tasks currently holding a permit
    pub fn in_flight(&self) -> usize {
        self.worker_count - self.permits.available_permits()
    }

    /// Runs the dispatch loop until the queue is drained
    ///
    /// # Loop
    ///
    /// While not (all identifiers queued and queue empty):
    /// 1. Pop the next identifier (suspends while the queue is empty)
    /// 2. Acquire a permit (suspends while `worker_count` are held)
    /// 3. Spawn the fetch task, which sends its completion and then drops the permit
    ///
    /// After the loop every outstanding task is awaited. If `cancel` fires at
    /// any point, all in-flight tasks are aborted and `MineError::Interrupted`
    /// is returned without draining.
    pub async fn run(
        &self,
        mut queue: QueueReader,
        completions: mpsc::Sender<Completion>,
        cancel: CancellationToken,
    ) -> Result<DispatchStats, MineError> {
        let mut stats = DispatchStats::default();
        let mut tasks = JoinSet::new();

        loop {
            let identifier = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(abort(&mut tasks)),
                next = queue.pop() => match next {
                    Some(identifier) => identifier,
                    None => break,
                },
            };

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(abort(&mut tasks)),
                permit = Arc::clone(&self.permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return Err(abort(&mut tasks)),
                },
            };

            // Reap finished tasks so the set only tracks live ones.
            while tasks.try_join_next().is_some() {}

            stats.dispatched += 1;
            stats.peak_in_flight = stats.peak_in_flight.max(self.in_flight());
            tracing::debug!(
                "Dispatching {} ({} in flight, {} queued)",
                identifier,
                self.in_flight(),
                queue.pending()
            );

            tasks.spawn(run_task(
                Arc::clone(&self.fetcher),
                identifier,
                permit,
                completions.clone(),
            ));
        }

        tracing::debug!("Queue drained, waiting for {} in-flight fetches", tasks.len());

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(abort(&mut tasks)),
                joined = tasks.join_next() => {
                    if joined.is_none() {
                        break;
                    }
                }
            }
        }

        Ok(stats)
    }
}

fn abort(tasks: &mut JoinSet<()>) -> MineError {
    tracing::debug!("Dispatch cancelled, aborting {} in-flight fetches", tasks.len());
    tasks.abort_all();
    MineError::Interrupted
}

/// Body of one fetch task
///
/// The fetch runs in its own task so a panicking fetcher is reported as a
/// failed completion instead of losing the identifier. The permit is held
/// until the completion has been sent.
async fn run_task<F>(
    fetcher: Arc<F>,
    identifier: Identifier,
    permit: OwnedSemaphorePermit,
    completions: mpsc::Sender<Completion>,
) where
    F: Fetcher + ?Sized + 'static,
{
    let _permit = permit;

    let fetch = {
        let identifier = identifier.clone();
        AbortOnDropHandle::new(tokio::spawn(async move {
            fetcher.fetch(&identifier).await
        }))
    };

    let result = match fetch.await {
        Ok(result) => result,
        Err(e) => Err(FetchError::TaskFailed {
            identifier: identifier.to_string(),
            message: e.to_string(),
        }),
    };

    if completions
        .send(Completion { identifier, result })
        .await
        .is_err()
    {
        tracing::debug!("Completion receiver closed, dropping result");
    }
}
