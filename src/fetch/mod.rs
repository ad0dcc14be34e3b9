// src/fetch/mod.rs

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{PortalError, PortalResult};

pub mod cache;
pub mod dir;
pub mod memory;

pub use cache::CachingFetcher;
pub use dir::DirFetcher;
pub use memory::MemoryFetcher;

/// Source of raw table and document bytes, addressed by location string.
///
/// Every failure (missing resource, non-success status, timeout) surfaces as
/// `PortalError::ResourceUnavailable`.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, location: &str) -> PortalResult<Bytes>;
}

/// Fetches resources over HTTP(S), resolving locations against a base URL.
///
/// Locations with a leading `/` resolve against the host root, others against
/// the base URL's path.
pub struct HttpFetcher {
    client: Client,
    base: Url,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> PortalResult<Self> {
        let base = Url::parse(base_url).with_context(|| format!("parsing base URL {}", base_url))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            base,
            timeout,
        })
    }

    pub fn resolve(&self, location: &str) -> PortalResult<Url> {
        self.base
            .join(location)
            .map_err(|e| PortalError::unavailable(location, e))
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, location: &str) -> PortalResult<Bytes> {
        let url = self.resolve(location)?;
        debug!(%url, "GET");

        let describe = |e: reqwest::Error| {
            if e.is_timeout() {
                format!("timed out after {:?}", self.timeout)
            } else {
                e.to_string()
            }
        };

        let resp = self.client.get(url.clone()).send().await.map_err(|e| {
            let reason = describe(e);
            warn!(%url, %reason, "fetch failed");
            PortalError::unavailable(location, reason)
        })?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%url, %status, "non-success status");
            return Err(PortalError::unavailable(location, format!("HTTP {}", status)));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| PortalError::unavailable(location, describe(e)))?;
        debug!(%url, size = bytes.len(), "fetched");
        Ok(bytes)
    }
}
