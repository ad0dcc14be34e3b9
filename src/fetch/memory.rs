// src/fetch/memory.rs

use async_trait::async_trait;
use bytes::Bytes;
use std::{
    collections::HashMap,
    sync::{Mutex, RwLock},
};

use super::ResourceFetcher;
use crate::error::{PortalError, PortalResult};

/// In-memory resource store for tests and offline demos.
///
/// Counts fetches per location so callers can assert on cache behaviour.
#[derive(Default)]
pub struct MemoryFetcher {
    entries: RwLock<HashMap<String, Bytes>>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, location: impl Into<String>, bytes: impl Into<Bytes>) {
        self.entries
            .write()
            .unwrap()
            .insert(location.into(), bytes.into());
    }

    pub fn remove(&self, location: &str) -> Option<Bytes> {
        self.entries.write().unwrap().remove(location)
    }

    /// Number of `fetch` calls seen for `location`, hits and misses alike.
    pub fn fetch_count(&self, location: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .get(location)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ResourceFetcher for MemoryFetcher {
    async fn fetch(&self, location: &str) -> PortalResult<Bytes> {
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(location.to_string())
            .or_default() += 1;

        self.entries
            .read()
            .unwrap()
            .get(location)
            .cloned()
            .ok_or_else(|| PortalError::unavailable(location, "not found"))
    }
}
