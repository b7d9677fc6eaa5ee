//! Shared HTTP session
//!
//! One `ArchiveSession` is built per run and shared by every fetch task
//! through an `Arc`. The underlying `reqwest::Client` keeps an internally
//! synchronized connection pool; a connection checked out by a request goes
//! back to the pool when the response is consumed or dropped, whether the
//! fetch succeeded or not.

use crate::config::SessionConfig;
use crate::miner::item::Identifier;
use crate::{ConfigError, MineError};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client from the session configuration
///
/// # Arguments
///
/// * `config` - The session configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &SessionConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Connection context shared by all fetches of a run
#[derive(Debug, Clone)]
pub struct ArchiveSession {
    client: Client,
    base_url: Url,
}

impl ArchiveSession {
    /// Builds the session from a validated configuration
    pub fn new(config: &SessionConfig) -> Result<Self, MineError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;
        let client = build_http_client(config).map_err(MineError::Session)?;
        Ok(Self { client, base_url })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of the metadata endpoint for `identifier`
    ///
    /// The identifier is appended as a single percent-encoded path segment,
    /// after any path already present in the base URL.
    pub fn metadata_url(&self, identifier: &Identifier) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("metadata")
                .push(identifier.as_str());
        }
        url
    }
}
