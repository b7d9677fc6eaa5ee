//! Output module: where fetched records end up
//!
//! This module handles:
//! - The `Sink` trait every completion consumer implements
//! - Stdout, per-item file and combined file sinks
//! - Run statistics

mod combined;
mod per_item;
pub mod stats;
mod stream;
mod traits;

pub use combined::CombinedSink;
pub use per_item::{PerItemSink, META_FILE_SUFFIX};
pub use stats::{log_summary, MineSummary};
pub use stream::StreamSink;
pub use traits::{Sink, SinkError, SinkResult};

use std::path::PathBuf;

/// Which sink a run writes to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One JSON line per record on stdout
    #[default]
    Stdout,

    /// One `<identifier>_meta.json` document per record
    PerItem { directory: PathBuf },

    /// One JSON line per record appended to a single file
    Combined { path: PathBuf },
}

/// Builds the sink for `mode`
///
/// The sink is chosen once per run; the engine only sees the trait object.
///
/// # Returns
///
/// * `Ok(Box<dyn Sink>)` - Ready-to-use sink
/// * `Err(SinkError)` - The output directory or file could not be prepared
pub fn build_sink(mode: &OutputMode) -> SinkResult<Box<dyn Sink>> {
    let sink: Box<dyn Sink> = match mode {
        OutputMode::Stdout => Box::new(StreamSink::stdout()),
        OutputMode::PerItem { directory } => Box::new(PerItemSink::new(directory.clone())?),
        OutputMode::Combined { path } => Box::new(CombinedSink::open(path.clone())?),
    };
    Ok(sink)
}
