// src/fetch/dir.rs

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::ResourceFetcher;
use crate::error::{PortalError, PortalResult};

/// Reads resources from a local directory (a static deployment's public root).
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a location onto the root; `..` and absolute components are refused.
    pub fn resolve(&self, location: &str) -> PortalResult<PathBuf> {
        let relative = Path::new(location.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(PortalError::unavailable(
                location,
                "location is outside the data root",
            ));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ResourceFetcher for DirFetcher {
    async fn fetch(&self, location: &str) -> PortalResult<Bytes> {
        let path = self.resolve(location)?;
        let bytes = fs::read(&path)
            .await
            .map_err(|e| PortalError::unavailable(location, e))?;
        debug!(path = %path.display(), size = bytes.len(), "read");
        Ok(Bytes::from(bytes))
    }
}
