// src/fetch/cache.rs

use async_trait::async_trait;
use bytes::Bytes;
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::time::Instant;
use tracing::{debug, trace};

use super::ResourceFetcher;
use crate::error::PortalResult;

struct CachedEntry {
    fetched_at: Instant,
    bytes: Bytes,
}

/// Pull-through cache keyed by location.
///
/// Entries live for at most `ttl`; only successful fetches are stored.
/// Locations registered through [`CachingFetcher::uncached`] always go to the
/// source, so a list published mid-deployment is seen on the next request.
pub struct CachingFetcher {
    inner: Arc<dyn ResourceFetcher>,
    ttl: Duration,
    uncached: HashSet<String>,
    entries: Mutex<HashMap<String, CachedEntry>>,
}

impl CachingFetcher {
    pub fn new(inner: Arc<dyn ResourceFetcher>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            uncached: HashSet::new(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Never cache these locations.
    pub fn uncached<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.uncached.extend(locations.into_iter().map(Into::into));
        self
    }

    pub fn invalidate(&self, location: &str) {
        if self.entries.lock().unwrap().remove(location).is_some() {
            debug!(location, "cache entry invalidated");
        }
    }

    pub fn invalidate_all(&self) {
        let mut entries = self.entries.lock().unwrap();
        debug!(count = entries.len(), "cache cleared");
        entries.clear();
    }

    fn cacheable(&self, location: &str) -> bool {
        !self.ttl.is_zero() && !self.uncached.contains(location)
    }

    fn lookup(&self, location: &str) -> Option<Bytes> {
        let mut entries = self.entries.lock().unwrap();
        let fresh = entries
            .get(location)
            .map(|entry| entry.fetched_at.elapsed() < self.ttl);
        match fresh {
            Some(true) => entries.get(location).map(|entry| entry.bytes.clone()),
            Some(false) => {
                entries.remove(location);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl ResourceFetcher for CachingFetcher {
    async fn fetch(&self, location: &str) -> PortalResult<Bytes> {
        if !self.cacheable(location) {
            trace!(location, "uncached location");
            return self.inner.fetch(location).await;
        }
        if let Some(bytes) = self.lookup(location) {
            trace!(location, "cache hit");
            return Ok(bytes);
        }

        let bytes = self.inner.fetch(location).await?;
        self.entries.lock().unwrap().insert(
            location.to_string(),
            CachedEntry {
                fetched_at: Instant::now(),
                bytes: bytes.clone(),
            },
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryFetcher;

    fn setup(ttl: Duration) -> (Arc<MemoryFetcher>, CachingFetcher) {
        let source = Arc::new(MemoryFetcher::new());
        source.insert("list.xlsx", b"v1".to_vec());
        let cache = CachingFetcher::new(source.clone(), ttl);
        (source, cache)
    }

    #[tokio::test(start_paused = true)]
    async fn serves_from_cache_within_ttl() {
        let (source, cache) = setup(Duration::from_secs(60));

        assert_eq!(cache.fetch("list.xlsx").await.unwrap(), b"v1".to_vec());
        source.insert("list.xlsx", b"v2".to_vec());
        assert_eq!(cache.fetch("list.xlsx").await.unwrap(), b"v1".to_vec());
        assert_eq!(source.fetch_count("list.xlsx"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refetches_after_ttl_expires() {
        let (source, cache) = setup(Duration::from_secs(60));

        cache.fetch("list.xlsx").await.unwrap();
        source.insert("list.xlsx", b"v2".to_vec());
        tokio::time::advance(Duration::from_secs(61)).await;

        assert_eq!(cache.fetch("list.xlsx").await.unwrap(), b"v2".to_vec());
        assert_eq!(source.fetch_count("list.xlsx"), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let (source, cache) = setup(Duration::from_secs(3600));

        cache.fetch("list.xlsx").await.unwrap();
        source.insert("list.xlsx", b"v2".to_vec());
        cache.invalidate("list.xlsx");
        assert_eq!(cache.fetch("list.xlsx").await.unwrap(), b"v2".to_vec());

        source.insert("list.xlsx", b"v3".to_vec());
        cache.invalidate_all();
        assert_eq!(cache.fetch("list.xlsx").await.unwrap(), b"v3".to_vec());
        assert_eq!(source.fetch_count("list.xlsx"), 3);
    }

    #[tokio::test]
    async fn zero_ttl_never_caches() {
        let (source, cache) = setup(Duration::ZERO);

        cache.fetch("list.xlsx").await.unwrap();
        cache.fetch("list.xlsx").await.unwrap();
        assert_eq!(source.fetch_count("list.xlsx"), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let (source, cache) = setup(Duration::from_secs(3600));

        assert!(cache.fetch("late.xlsx").await.is_err());
        source.insert("late.xlsx", b"ok".to_vec());
        assert_eq!(cache.fetch("late.xlsx").await.unwrap(), b"ok".to_vec());
    }

    #[tokio::test]
    async fn uncached_locations_always_reach_the_source() {
        let (source, cache) = setup(Duration::from_secs(3600));
        let cache = cache.uncached(["list.xlsx"]);
        source.insert("doc.pdf", b"pdf".to_vec());

        cache.fetch("list.xlsx").await.unwrap();
        source.insert("list.xlsx", b"v2".to_vec());
        assert_eq!(cache.fetch("list.xlsx").await.unwrap(), b"v2".to_vec());
        assert_eq!(source.fetch_count("list.xlsx"), 2);

        cache.fetch("doc.pdf").await.unwrap();
        cache.fetch("doc.pdf").await.unwrap();
        assert_eq!(source.fetch_count("doc.pdf"), 1);
    }

    #[tokio::test]
    async fn hits_share_the_cached_buffer() {
        let (_, cache) = setup(Duration::from_secs(3600));
        let first = cache.fetch("list.xlsx").await.unwrap();
        let second = cache.fetch("list.xlsx").await.unwrap();
        assert_eq!(first.as_ptr(), second.as_ptr());
    }
}
