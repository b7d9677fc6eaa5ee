//! Mining coordinator - run orchestration and the engine state machine
//!
//! This module wires the pieces of a run together:
//! - The feeder and the dispatcher run concurrently on the calling task
//! - Fetch tasks run on the runtime's worker pool
//! - A collector on a blocking thread hands completions to the sink
//! - Cancellation moves the engine straight to `Terminated`

use crate::config::MinerConfig;
use crate::miner::dispatcher::{Completion, DispatchStats, Dispatcher};
use crate::miner::feeder::{feed_identifiers, FeedStats};
use crate::miner::fetcher::Fetcher;
use crate::miner::queue::bounded;
use crate::output::{log_summary, MineSummary, Sink, SinkResult};
use crate::{ConfigError, MineError};
use chrono::Utc;
use std::sync::Arc;
use tokio::io::AsyncBufRead;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Lifecycle of a mining run
///
/// `Idle` → `Running` → `Draining` → `Done`, or `Terminated` from any state
/// once the run is cancelled or the identifier input fails. `Done` is only
/// reached by a run that returns a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Constructed, not started
    Idle,
    /// Feeder and dispatcher both active
    Running,
    /// Every identifier queued; queue emptying and fetches completing
    Draining,
    /// All completions delivered to the sink
    Done,
    /// Cancelled without draining, or stopped by an input failure
    Terminated,
}

impl EngineState {
    pub fn is_finished(&self) -> bool {
        matches!(self, EngineState::Done | EngineState::Terminated)
    }
}

/// Counters produced by the collector
#[derive(Debug, Clone, Copy, Default)]
struct CollectStats {
    written: u64,
    fetch_failures: u64,
    sink_failures: u64,
}

/// The mining engine
///
/// Owns the fetcher (and through it the session) and the sink for the
/// duration of a run.
pub struct Miner<F: ?Sized> {
    config: MinerConfig,
    fetcher: Arc<F>,
    sink: Arc<dyn Sink>,
    state: watch::Sender<EngineState>,
}

impl<F> Miner<F>
where
    F: Fetcher + ?Sized + 'static,
{
    /// Creates a new engine in the `Idle` state
    ///
    /// # Arguments
    ///
    /// * `config` - Worker count and queue capacity
    /// * `fetcher` - Performs the per-identifier retrieval
    /// * `sink` - Receives every fetched record
    pub fn new(config: MinerConfig, fetcher: Arc<F>, sink: impl Into<Arc<dyn Sink>>) -> Self {
        let (state, _) = watch::channel(EngineState::Idle);
        Self {
            config,
            fetcher,
            sink: sink.into(),
            state,
        }
    }

    /// Current engine state
    pub fn state(&self) -> EngineState {
        *self.state.borrow()
    }

    /// Receiver notified on every state transition
    pub fn subscribe_state(&self) -> watch::Receiver<EngineState> {
        self.state.subscribe()
    }

    fn transition(&self, next: EngineState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::debug!("Engine state: {:?} -> {:?}", previous, next);
        }
    }

    /// Runs the engine over every identifier read from `reader`
    ///
    /// Completes once the input is exhausted, the queue is drained and every
    /// fetched record has been handed to the sink. Per-identifier fetch and
    /// sink failures are logged and counted, never fatal.
    ///
    /// # Returns
    ///
    /// * `Ok(MineSummary)` - The run finished (`EngineState::Done`)
    /// * `Err(MineError::Interrupted)` - `cancel` fired (`EngineState::Terminated`)
    /// * `Err(MineError::Input)` - The source failed mid-read; work already
    ///   queued was still completed (`EngineState::Terminated`)
    pub async fn run<R>(&self, reader: R, cancel: CancellationToken) -> Result<MineSummary, MineError>
    where
        R: AsyncBufRead + Unpin,
    {
        if self.config.worker_count == 0 || self.config.queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "worker-count and queue-capacity must be >= 1".to_string(),
            )
            .into());
        }

        // Start the run
        let started_at = Utc::now();
        tracing::info!(
            "Mining with {} workers (queue capacity {})",
            self.config.worker_count,
            self.config.queue_capacity
        );
        self.transition(EngineState::Running);

        // Build the queue, completion channel and dispatcher
        let (writer, queue) = bounded(self.config.queue_capacity);
        let (completion_tx, completion_rx) = mpsc::channel(self.config.worker_count);
        let dispatcher = Dispatcher::new(Arc::clone(&self.fetcher), self.config.worker_count);

        // Sink I/O is synchronous, so the collector gets a blocking thread
        let sink = Arc::clone(&self.sink);
        let mut collector =
            tokio::task::spawn_blocking(move || collect_completions(completion_rx, sink.as_ref()));

        let feed = async {
            let result = feed_identifiers(reader, writer, cancel.clone()).await;
            if result.is_ok() {
                self.transition(EngineState::Draining);
            }
            result
        };

        // Feed and dispatch concurrently until the queue is drained
        let (fed, dispatched) = tokio::join!(
            feed,
            dispatcher.run(queue, completion_tx, cancel.clone())
        );

        let dispatch_stats: DispatchStats = match (dispatched, &fed) {
            (Err(e), _) => return Err(self.terminate(e)),
            (Ok(_), Err(MineError::Interrupted)) => {
                return Err(self.terminate(MineError::Interrupted))
            }
            (Ok(stats), _) => stats,
        };

        // Wait for the collector to hand the last completion to the sink
        let collected = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(self.terminate(MineError::Interrupted)),
            joined = &mut collector => joined
                .map_err(|e| MineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??,
        };

        // Queued work is drained; a failed input still ends the run in error
        let feed_stats = match fed {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!("Identifier input failed after {} completions: {}", collected.written, e);
                self.transition(EngineState::Terminated);
                return Err(e);
            }
        };
        self.transition(EngineState::Done);

        // Report statistics
        let summary = build_summary(started_at, feed_stats, dispatch_stats, collected, self.state());
        log_summary(&summary);
        Ok(summary)
    }

    fn terminate(&self, error: MineError) -> MineError {
        tracing::warn!("Mining terminated: {}", error);
        self.transition(EngineState::Terminated);
        error
    }
}

fn build_summary(
    started_at: chrono::DateTime<Utc>,
    feed: FeedStats,
    dispatch: DispatchStats,
    collected: CollectStats,
    state: EngineState,
) -> MineSummary {
    MineSummary {
        started_at,
        finished_at: Utc::now(),
        lines_read: feed.lines_read,
        blank_lines_skipped: feed.blank_lines_skipped,
        identifiers_queued: feed.identifiers_queued,
        dispatched: dispatch.dispatched,
        peak_in_flight: dispatch.peak_in_flight,
        items_written: collected.written,
        fetch_failures: collected.fetch_failures,
        sink_failures: collected.sink_failures,
        state,
    }
}

/// Hands every completion to the sink until all senders are gone
///
/// Runs on a blocking thread: sinks do synchronous file and stdout I/O.
/// Failures are isolated to their identifier.
fn collect_completions(
    mut completions: mpsc::Receiver<Completion>,
    sink: &dyn Sink,
) -> SinkResult<CollectStats> {
    let mut stats = CollectStats::default();

    while let Some(Completion { identifier, result }) = completions.blocking_recv() {
        match result {
            Ok(item) => match sink.write_item(&item) {
                Ok(()) => stats.written += 1,
                Err(e) => {
                    tracing::warn!("Failed to write {}: {}", identifier, e);
                    stats.sink_failures += 1;
                }
            },
            Err(e) => {
                tracing::warn!("{}", e);
                stats.fetch_failures += 1;
            }
        }
    }

    sink.finish()?;
    Ok(stats)
}
