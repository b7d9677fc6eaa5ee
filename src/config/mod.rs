//! Configuration module for ia-mine
//!
//! Settings come from an optional TOML file; every value has a default so an
//! empty file (or no file at all) yields a working configuration. The CLI
//! overrides individual values after loading.
//!
//! # Example
//!
//! ```no_run
//! use ia_mine::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mine.toml")).unwrap();
//! println!("Workers: {}", config.miner.worker_count);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, MinerConfig, OutputConfig, SessionConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
