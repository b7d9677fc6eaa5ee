//! Metadata fetcher
//!
//! This module performs the remote retrieval for a single identifier:
//! - The `Fetcher` trait the dispatcher drives
//! - `ArchiveFetcher`, the archive.org metadata API implementation
//! - Error classification into `FetchError`
//!
//! Timeouts come from the session's HTTP client. There is no retry.

use crate::miner::item::{Identifier, Item};
use crate::miner::session::ArchiveSession;
use crate::FetchError;
use async_trait::async_trait;
use std::sync::Arc;

/// Retrieves the metadata record of one identifier
///
/// Implementations are shared by every in-flight task and must be safe for
/// concurrent use.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, identifier: &Identifier) -> Result<Item, FetchError>;
}

/// Fetches item metadata from the archive.org metadata API
#[derive(Debug, Clone)]
pub struct ArchiveFetcher {
    session: Arc<ArchiveSession>,
}

impl ArchiveFetcher {
    pub fn new(session: Arc<ArchiveSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &ArchiveSession {
        &self.session
    }
}

#[async_trait]
impl Fetcher for ArchiveFetcher {
    /// Fetches `GET {base-url}/metadata/{identifier}`
    ///
    /// # Outcomes
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Connection/timeout/TLS failure | `FetchError::Http` |
    /// | Non-2xx status | `FetchError::Status` |
    /// | Body is not JSON | `FetchError::Decode` |
    /// | Body is `{}` (unknown item) | `FetchError::NotFound` |
    /// | Anything else | `Item` with the body as metadata |
    async fn fetch(&self, identifier: &Identifier) -> Result<Item, FetchError> {
        let url = self.session.metadata_url(identifier);
        tracing::debug!("Fetching metadata: {}", url);

        let http_error = |source: reqwest::Error| FetchError::Http {
            identifier: identifier.to_string(),
            source,
        };

        let response = self
            .session
            .client()
            .get(url)
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                identifier: identifier.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(http_error)?;
        let metadata: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
                identifier: identifier.to_string(),
                message: e.to_string(),
            })?;

        if metadata.as_object().is_some_and(|fields| fields.is_empty()) {
            return Err(FetchError::NotFound {
                identifier: identifier.to_string(),
            });
        }

        Ok(Item::new(identifier.clone(), metadata))
    }
}
