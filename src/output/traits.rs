//! Sink trait and error types
//!
//! This module defines the interface every completion sink implements and
//! the error type for sink operations.

use crate::miner::Item;
use thiserror::Error;

/// Errors that can occur while writing a record
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Identifier '{0}' cannot be used as a file name")]
    InvalidFileName(String),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Consumer of fetched records
///
/// A sink receives each successfully fetched item exactly once, in
/// completion order. A failed write affects only that item; the engine logs
/// it and keeps going. Implementations must be thread-safe.
pub trait Sink: Send + Sync {
    /// Writes one record
    ///
    /// Must never leave a partial JSON document or line behind when it fails.
    fn write_item(&self, item: &Item) -> SinkResult<()>;

    /// Flushes buffered output once the run is complete
    fn finish(&self) -> SinkResult<()> {
        Ok(())
    }
}
