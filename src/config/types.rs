use crate::output::OutputMode;
use serde::Deserialize;
use std::path::PathBuf;

/// Default number of concurrent metadata requests
pub const DEFAULT_WORKER_COUNT: usize = 20;

/// Default capacity of the identifier queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Default metadata API host
pub const DEFAULT_BASE_URL: &str = "https://archive.org";

/// Main configuration structure for ia-mine
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub miner: MinerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Mining engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Maximum number of metadata requests in flight
    #[serde(rename = "worker-count")]
    pub worker_count: usize,

    /// Number of identifiers buffered between the reader and the dispatcher
    #[serde(rename = "queue-capacity")]
    pub queue_capacity: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// HTTP session configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Scheme and host of the metadata API
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User-Agent header; defaults to `ia-mine/<version>`
    #[serde(rename = "user-agent")]
    pub user_agent: Option<String>,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: None,
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl SessionConfig {
    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("ia-mine/{}", env!("CARGO_PKG_VERSION")))
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write each record to `<identifier>_meta.json`
    #[serde(rename = "cache-to-per-item-files")]
    pub cache_to_per_item_files: bool,

    /// Directory receiving per-item files
    #[serde(rename = "cache-directory")]
    pub cache_directory: String,

    /// Append every record to this single JSON-lines file
    #[serde(rename = "combined-output-path")]
    pub combined_output_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            cache_to_per_item_files: false,
            cache_directory: ".".to_string(),
            combined_output_path: None,
        }
    }
}

impl OutputConfig {
    /// Resolves the sink variant described by this configuration
    ///
    /// Assumes the configuration has been validated; if both options are set
    /// anyway, per-item caching wins.
    pub fn mode(&self) -> OutputMode {
        if self.cache_to_per_item_files {
            OutputMode::PerItem {
                directory: PathBuf::from(&self.cache_directory),
            }
        } else if let Some(path) = &self.combined_output_path {
            OutputMode::Combined {
                path: PathBuf::from(path),
            }
        } else {
            OutputMode::Stdout
        }
    }
}
