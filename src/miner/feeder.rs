//! Identifier feeder
//!
//! Reads the identifier list line by line and pushes every identifier onto
//! the bounded queue in input order. Lines that are blank after trimming
//! are skipped.

use crate::miner::item::Identifier;
use crate::miner::queue::QueueWriter;
use crate::{InputError, MineError};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

/// Reserved item-list argument selecting standard input
pub const STDIN_TOKEN: &str = "-";

/// Where the identifier list is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierSource {
    Stdin,
    File(PathBuf),
}

impl IdentifierSource {
    /// Interprets a command-line item-list argument
    pub fn from_arg(arg: &str) -> Self {
        if arg == STDIN_TOKEN {
            IdentifierSource::Stdin
        } else {
            IdentifierSource::File(PathBuf::from(arg))
        }
    }
}

/// Line-oriented reader over an identifier source
pub type IdentifierReader = Box<dyn AsyncBufRead + Unpin + Send>;

/// Opens the identifier source
///
/// Called before any work starts so an unreadable list fails the run early.
pub async fn open_identifier_source(
    source: &IdentifierSource,
) -> Result<IdentifierReader, InputError> {
    match source {
        IdentifierSource::Stdin => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
        IdentifierSource::File(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|source| InputError::Open {
                    path: path.clone(),
                    source,
                })?;
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

/// Counters produced by one feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub lines_read: u64,
    pub blank_lines_skipped: u64,
    pub identifiers_queued: u64,
}

/// Pushes every identifier read from `reader` onto the queue
///
/// Suspends whenever the queue is full. On reaching the end of input the
/// queue is marked as fully queued. A read error stops feeding; the queue is
/// then closed without the "all queued" mark and the error is returned.
///
/// Returns `MineError::Interrupted` if `cancel` fires while waiting on the
/// input or on a full queue.
pub async fn feed_identifiers<R>(
    reader: R,
    writer: QueueWriter,
    cancel: CancellationToken,
) -> Result<FeedStats, MineError>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = FeedStats::default();
    let mut lines = reader.lines();

    loop {
        // Read the next line
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MineError::Interrupted),
            line = lines.next_line() => line.map_err(InputError::Read)?,
        };

        let Some(line) = line else {
            break;
        };
        stats.lines_read += 1;

        // Trim and skip blank lines
        let identifier = Identifier::new(&line);
        if identifier.is_empty() {
            stats.blank_lines_skipped += 1;
            tracing::debug!("Skipping blank line {}", stats.lines_read);
            continue;
        }

        // Queue it, waiting while the queue is full
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MineError::Interrupted),
            pushed = writer.push(identifier) => {
                if let Err(identifier) = pushed {
                    return Err(MineError::Queue {
                        identifier: identifier.to_string(),
                    });
                }
            }
        }
        stats.identifiers_queued += 1;
    }

    // End of input
    writer.finish();
    tracing::debug!(
        "All {} identifiers queued ({} blank lines skipped)",
        stats.identifiers_queued,
        stats.blank_lines_skipped
    );

    Ok(stats)
}
