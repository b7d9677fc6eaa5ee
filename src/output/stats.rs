//! Run statistics
//!
//! Counters gathered while mining, reported once the run ends.

use crate::miner::EngineState;
use chrono::{DateTime, Utc};

/// Summary of a finished mining run
#[derive(Debug, Clone, PartialEq)]
pub struct MineSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Lines read from the identifier source
    pub lines_read: u64,

    /// Lines skipped because they were blank after trimming
    pub blank_lines_skipped: u64,

    /// Identifiers pushed onto the queue
    pub identifiers_queued: u64,

    /// Identifiers handed to a fetch task
    pub dispatched: u64,

    /// Highest number of concurrent fetches observed
    pub peak_in_flight: usize,

    /// Records successfully written by the sink
    pub items_written: u64,

    pub fetch_failures: u64,
    pub sink_failures: u64,

    pub state: EngineState,
}

impl MineSummary {
    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    pub fn total_failures(&self) -> u64 {
        self.fetch_failures + self.sink_failures
    }

    /// Items written per second of wall-clock time
    pub fn rate(&self) -> f64 {
        let seconds = self.duration_seconds();
        if seconds <= 0.0 {
            return 0.0;
        }
        self.items_written as f64 / seconds
    }
}

/// Logs a summary at info level
///
/// Statistics go to the log (stderr) rather than stdout, which carries the
/// records themselves in the default output mode.
pub fn log_summary(summary: &MineSummary) {
    tracing::info!(
        "Mining {:?}: {} written, {} fetch failures, {} sink failures in {:.2}s ({:.2} items/sec)",
        summary.state,
        summary.items_written,
        summary.fetch_failures,
        summary.sink_failures,
        summary.duration_seconds(),
        summary.rate()
    );
    tracing::info!(
        "Input: {} lines read, {} blank skipped, {} queued, {} dispatched, peak concurrency {}",
        summary.lines_read,
        summary.blank_lines_skipped,
        summary.identifiers_queued,
        summary.dispatched,
        summary.peak_in_flight
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn summary() -> MineSummary {
        let started_at = Utc::now();
        MineSummary {
            started_at,
            finished_at: started_at + Duration::seconds(4),
            lines_read: 12,
            blank_lines_skipped: 2,
            identifiers_queued: 10,
            dispatched: 10,
            peak_in_flight: 3,
            items_written: 8,
            fetch_failures: 1,
            sink_failures: 1,
            state: EngineState::Done,
        }
    }

    #[test]
    fn test_duration_and_rate() {
        let summary = summary();
        assert!((summary.duration_seconds() - 4.0).abs() < 0.001);
        assert!((summary.rate() - 2.0).abs() < 0.001);
        assert_eq!(summary.total_failures(), 2);
    }

    #[test]
    fn test_rate_zero_duration() {
        let mut summary = summary();
        summary.finished_at = summary.started_at;
        assert_eq!(summary.rate(), 0.0);
    }
}
