//! Mining engine for bulk metadata retrieval
//!
//! This module contains the concurrent core of the crate:
//! - Reading identifiers into a bounded queue
//! - Dispatching fetches under a fixed concurrency cap
//! - The HTTP session and metadata fetcher
//! - Overall run coordination and the engine state machine

mod coordinator;
mod dispatcher;
mod feeder;
mod fetcher;
mod item;
mod queue;
mod session;

pub use coordinator::{EngineState, Miner};
pub use dispatcher::{Completion, DispatchStats, Dispatcher};
pub use feeder::{
    feed_identifiers, open_identifier_source, FeedStats, IdentifierReader, IdentifierSource,
    STDIN_TOKEN,
};
pub use fetcher::{ArchiveFetcher, Fetcher};
pub use item::{Identifier, Item};
pub use queue::{bounded, QueueReader, QueueWriter};
pub use session::{build_http_client, ArchiveSession};

use crate::config::{validate, Config};
use crate::output::{build_sink, MineSummary};
use crate::MineError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs a complete mining operation against the archive.org metadata API
///
/// This is the main entry point used by the CLI. It will:
/// 1. Validate the configuration and open the identifier source (both
///    fatal before any work starts)
/// 2. Build the shared HTTP session
/// 3. Build the sink selected by the output configuration
/// 4. Feed, dispatch and collect until the input is exhausted or `cancel`
///    fires
///
/// # Arguments
///
/// * `config` - Configuration; validated before any work starts
/// * `source` - Where identifiers are read from
/// * `cancel` - Token that aborts the run without draining
pub async fn mine(
    config: &Config,
    source: &IdentifierSource,
    cancel: CancellationToken,
) -> Result<MineSummary, MineError> {
    // Validate the configuration
    validate(config)?;

    // Open the identifier source
    let reader = open_identifier_source(source).await?;

    // Build the session and sink
    let session = Arc::new(ArchiveSession::new(&config.session)?);
    let fetcher = ArchiveFetcher::new(session);
    let sink = build_sink(&config.output.mode())?;

    let miner = Miner::new(config.miner.clone(), Arc::new(fetcher), sink);
    miner.run(reader, cancel).await
}
