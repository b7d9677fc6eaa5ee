//! ia-mine: concurrent metadata retrieval for archive.org items
//!
//! This crate fetches the metadata record of every identifier in a list,
//! keeping a bounded number of requests in flight, and streams each record
//! to stdout, to one file per item, or to a single combined file.

pub mod config;
pub mod miner;
pub mod output;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for run-level failures
///
/// Per-identifier failures ([`FetchError`], [`output::SinkError`]) never
/// surface here; they are logged and counted in the run summary.
#[derive(Debug, Error)]
pub enum MineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Failed to prepare output: {0}")]
    Output(#[from] output::SinkError),

    #[error("Failed to build HTTP session: {0}")]
    Session(#[source] reqwest::Error),

    #[error("Identifier queue closed before {identifier} could be queued")]
    Queue { identifier: String },

    #[error("Run interrupted")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors reading the identifier list
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to open identifier list {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read identifier list: {0}")]
    Read(#[from] std::io::Error),
}

/// Failure to retrieve the metadata of a single identifier
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {identifier}: {source}")]
    Http {
        identifier: String,
        source: reqwest::Error,
    },

    #[error("Unexpected HTTP status {status} for {identifier}")]
    Status { identifier: String, status: u16 },

    #[error("Malformed metadata for {identifier}: {message}")]
    Decode { identifier: String, message: String },

    #[error("No such item: {identifier}")]
    NotFound { identifier: String },

    #[error("Fetch task for {identifier} failed: {message}")]
    TaskFailed { identifier: String, message: String },
}

impl FetchError {
    /// Identifier the failure belongs to
    pub fn identifier(&self) -> &str {
        match self {
            FetchError::Http { identifier, .. }
            | FetchError::Status { identifier, .. }
            | FetchError::Decode { identifier, .. }
            | FetchError::NotFound { identifier }
            | FetchError::TaskFailed { identifier, .. } => identifier,
        }
    }
}

/// Result type alias for run-level operations
pub type Result<T> = std::result::Result<T, MineError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use miner::{EngineState, Identifier, Item, Miner};
pub use output::{build_sink, MineSummary, OutputMode, Sink};
